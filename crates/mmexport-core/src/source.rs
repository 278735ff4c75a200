//! The content store the exporter reads from.

use crate::collection::Collection;
use crate::error::Result;
use crate::package::PackageInfo;
use crate::single::Single;

/// Read access to packages and their content.
///
/// Collections and singles are returned with their package memberships
/// filled in; the exporter keeps the ones that belong to the package being
/// exported.
#[cfg_attr(test, mockall::automock)]
pub trait ContentSource: Send + Sync {
    /// Every known package.
    fn packages(&self) -> Result<Vec<PackageInfo>>;

    /// Look up one package by slug.
    fn find_package(&self, slug: &str) -> Result<Option<PackageInfo>>;

    /// All collections available in `locale`.
    fn collections(&self, locale: &str) -> Result<Vec<Collection>>;

    /// All singles available in `locale`.
    fn singles(&self, locale: &str) -> Result<Vec<Single>>;
}
