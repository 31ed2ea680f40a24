//! Identity of the error-collection harness the fixer installs.

pub const DEFAULT_IMPORT_PATH: &str = "github.com/defercheck/collector";
pub const SENTINEL_BINDING: &str = "g";
pub const DEFAULT_ERR_NAME: &str = "err";
pub const CONSTRUCTOR_NAME: &str = "New";
pub const GUARD_METHOD: &str = "Guard";
pub const COLLECT_METHOD: &str = "Collect";

/// Every name the matchers compare against and the synthesizer writes out
/// comes from one of these fields. There is exactly one instance per
/// analysis run, passed in at construction; nothing reads the names from
/// anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSpec {
    pub import_path: String,
    pub package_name: String,
    pub binding: String,
    pub constructor: String,
    pub guard_method: String,
    pub collect_method: String,
    pub default_err_name: String,
}

impl HarnessSpec {
    /// Package name is the last path segment, matching how an import
    /// without an alias is referenced.
    pub fn with_import_path(path: &str) -> HarnessSpec {
        let package_name = path.rsplit('/').next().unwrap_or(path).to_string();
        HarnessSpec {
            import_path: path.to_string(),
            package_name,
            binding: SENTINEL_BINDING.to_string(),
            constructor: CONSTRUCTOR_NAME.to_string(),
            guard_method: GUARD_METHOD.to_string(),
            collect_method: COLLECT_METHOD.to_string(),
            default_err_name: DEFAULT_ERR_NAME.to_string(),
        }
    }

    pub fn fix_label(&self) -> String {
        format!("Handle defer with {}", self.package_name)
    }
}

impl Default for HarnessSpec {
    fn default() -> Self {
        HarnessSpec::with_import_path(DEFAULT_IMPORT_PATH)
    }
}
