use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to find how a crate is reachable from
/// the code a proc-macro emits.
///
/// # Example
///
/// ```rust
/// # use vc_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_decode"));
/// ```
///
/// Reading the manifest is not cheap; call it once per macro invocation
/// and pass the resulting path around.
///
/// # Resolution rules
///
/// 1. The requested crate is a dependency: `::crate_name`, or the local
///    name if the dependency was renamed with `package = "crate_name"`.
/// 2. The name begins with `vc_` and the caller depends on the facade
///    `vc_twin`: `::vc_twin::short_name` (e.g. `vc_decode` -> `::vc_twin::decode`).
/// 3. Steps 1-2 again with `dev-dependencies`.
/// 4. Otherwise `::crate_name`.
///
/// A crate naming itself should declare `extern crate self as crate_name;`
/// so the absolute path also resolves inside it.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const FACADE_NAME: &str = "vc_twin";
const CRATE_PREFIX: &str = "vc_";

impl Manifest {
    #[inline(never)]
    fn get_manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .expect("CARGO_MANIFEST_DIR should be auto-defined by cargo.");
        let path = PathBuf::from(dir).join("Cargo.toml");
        assert!(
            path.exists(),
            "Cargo manifest does not exist at path {}",
            path.display(),
        );
        path
    }

    #[inline(never)]
    fn get_manifest_modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    #[inline(never)]
    fn read_manifest(path: &Path) -> Document<Box<str>> {
        let manifest = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()))
            .into_boxed_str();
        Self::parse(manifest)
            .unwrap_or_else(|| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    #[inline]
    fn parse(manifest: Box<str>) -> Option<Document<Box<str>>> {
        Document::parse(manifest).ok()
    }

    #[inline]
    fn absolute(segments: &[&str]) -> syn::Path {
        let path = segments
            .iter()
            .fold(String::new(), |path, segment| path + "::" + *segment);
        syn::parse_str(&path).unwrap_or_else(|_| panic!("`{path}` is not a valid path"))
    }

    // Local name of the dependency on package `name`, if any.
    fn local_name<'t>(deps: &'t Table, name: &str) -> Option<&'t str> {
        if let Some((key, _)) = deps.get_key_value(name) {
            return Some(key.get());
        }
        deps.iter().find_map(|(key, item)| {
            let package = item.get("package")?.as_str()?;
            (package == name).then_some(key)
        })
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if let Some(local) = Self::local_name(deps, name) {
            return Some(Self::absolute(&[local]));
        }
        let module = name.strip_prefix(CRATE_PREFIX)?;
        let facade = Self::local_name(deps, FACADE_NAME)?;
        Some(Self::absolute(&[facade, module]))
    }

    /// Returns the [`syn::Path`] of package `name` as seen from the caller.
    /// See the type documentation for the resolution order.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        for section in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = self.manifest.get(section)
                && let Some(path) = Self::find_in_deps(deps, name)
            {
                return path;
            }
        }
        Self::absolute(&[name])
    }

    /// Runs `func` with the caller's manifest.
    ///
    /// Manifests are cached per path and re-read when the file changes.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let manifest_path = Self::get_manifest_path();
        let modified_time = Self::get_manifest_modified_time(&manifest_path)
            .expect("The Cargo.toml should have a modified time.");

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&manifest_path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read_manifest(&manifest_path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest_path, manifest);

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use quote::ToTokens;

    use super::Manifest;

    fn manifest(toml: &str) -> Manifest {
        Manifest {
            manifest: Manifest::parse(toml.into()).unwrap(),
            modified_time: SystemTime::UNIX_EPOCH,
        }
    }

    fn path_of(manifest: &Manifest, name: &str) -> String {
        manifest
            .get_crate_path(name)
            .to_token_stream()
            .to_string()
            .replace(' ', "")
    }

    #[test]
    fn direct_dependency() {
        let m = manifest("[dependencies]\nvc_decode = \"0.0.1\"\n");
        assert_eq!(path_of(&m, "vc_decode"), "::vc_decode");
    }

    #[test]
    fn direct_dev_dependency() {
        let m = manifest("[dev-dependencies.vc_decode]\npath = \"../vc_decode\"\n");
        assert_eq!(path_of(&m, "vc_decode"), "::vc_decode");
    }

    #[test]
    fn through_facade() {
        let m = manifest("[dependencies]\nvc_twin = { path = \"..\" }\n");
        assert_eq!(path_of(&m, "vc_decode"), "::vc_twin::decode");
    }

    #[test]
    fn renamed_dependency() {
        let m = manifest("[dev-dependencies]\ndec = { package = \"vc_decode\", version = \"0.0.1\" }\n");
        assert_eq!(path_of(&m, "vc_decode"), "::dec");
    }

    #[test]
    fn fallback() {
        let m = manifest("[package]\nname = \"x\"\n");
        assert_eq!(path_of(&m, "vc_decode"), "::vc_decode");
    }
}
