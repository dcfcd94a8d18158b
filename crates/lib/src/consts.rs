/// Scope key of the global profile set, both in memory and in `state.json`.
pub const SHARED_NAME: &str = "Shared";

/// Config file names probed in the solution root, first match wins.
pub const CONFIG_CANDIDATES: &[&str] = &[".envswitch", ".vseswitchenv", ".editorconfig"];

/// Extension directory, relative to the solution root.
pub const EXT_REL_PATH: &str = ".vs/envswitch";

/// Persisted selection file name within the extension directory.
pub const STATE_FILENAME: &str = "state.json";

/// File extension of every derived property sheet.
pub const PROPS_EXT: &str = "props";

/// Infix separating a scope name from the generation stamp of an artifact.
pub const ARTIFACT_INFIX: &str = "env-";

/// MSBuild XML namespace.
pub const MSBUILD_NS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

/// Condition gating preprocessor definitions to C++ projects.
pub const VC_PROJECT_CONDITION: &str = "'$(VCProjectVersion)' != ''";
