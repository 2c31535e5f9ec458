//! Static rule tables for app manifests.
//!
//! Everything in this module is immutable data compiled into the binary:
//! allowed field names per scope, the machine-tier table, the execution
//! environments an image may target, argument render types and the
//! executor/version table used by managed images and legacy executor
//! specifiers.

use std::fmt;

/// The only `biolib_version` accepted by the version gate.
pub const SUPPORTED_BIOLIB_VERSION: i64 = 2;

/// Manifest version that used the legacy `executor`/`path` task dialect.
pub const LEGACY_BIOLIB_VERSION: i64 = 1;

/// Upper bound for `reserved_machines`.
pub const RESERVED_MACHINES_MAX: i64 = 25;

/// Fields accepted at the root of a manifest.
pub const ROOT_FIELDS: &[&str] = &[
    "arguments",
    "biolib_version",
    "citation",
    "consumes_stdin",
    "description_file",
    "license_file",
    "modules",
    "output_type",
    "remote_hosts",
    "requires_user_identity",
    "source_files_ignore",
    "main_output_file",
    "reserved_machines",
    "app_data",
    "auto_run_once_validation_passes",
];

/// Task fields accepted by every dialect.
pub const TASK_BASE_FIELDS: &[&str] = &["working_directory"];

/// Task fields of the legacy (`biolib_version: 1`) dialect.
pub const LEGACY_TASK_FIELDS: &[&str] = &["executor", "path"];

/// Task fields of the current (`biolib_version: 2`) dialect.
pub const CURRENT_TASK_FIELDS: &[&str] = &[
    "image",
    "input_files",
    "output_files",
    "source_files",
    "large_file_systems",
    "data_records",
    "command",
    "gpu",
    "secrets",
    "default_machine",
    "disable_default_machine_override",
];

/// Task fields that were replaced by `default_machine`.
pub const DEPRECATED_TASK_FIELDS: &[&str] =
    &["required_cpu_in_nano_shares", "required_memory_in_bytes"];

/// Fields accepted on an argument entry.
pub const ARGUMENT_FIELDS: &[&str] = &[
    "default_value",
    "description",
    "do_not_pass_if_value_empty",
    "exclude_value",
    "key",
    "key_value_separator",
    "options",
    "required",
    "sub_arguments",
    "type",
    "group_arguments",
    "group_separator",
    "group_argument_separator",
];

/// Values accepted by `output_type`.
pub const STDOUT_RENDER_TYPES: &[&str] = &["text", "markdown", "html"];

/// Render kinds accepted by an argument's `type`.
pub const RENDER_TYPES: &[&str] = &[
    "drag-and-drop-file",
    "drag-and-drop-files",
    "dropdown",
    "file",
    "group",
    "hidden",
    "multifile",
    "multiselect",
    "number",
    "radio",
    "sequence",
    "sequence-beta",
    "text",
    "text-file",
    "textarea",
    "toggle",
];

/// Render type whose arguments must declare `on`/`off` options.
pub const TOGGLE_RENDER_TYPE: &str = "toggle";

/// Render type exempt from the description requirement.
pub const HIDDEN_RENDER_TYPE: &str = "hidden";

/// Repository namespace of images managed by the platform.
pub const MANAGED_IMAGE_NAMESPACE: &str = "biolib/";

/// Version accepted for any executor.
pub const EXECUTOR_VERSION_WILDCARD: &str = "*";

/// Execution environment an image reference targets (`<env>://...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Another app or a platform-managed executor image.
    BiolibApp,
    /// A public Docker Hub image.
    Dockerhub,
    /// An image built on the publishing machine.
    LocalDocker,
    /// A data-only module; file mappings are optional.
    AppData,
}

impl Environment {
    /// All environments in the order they are presented to users.
    pub const ALL: [Environment; 4] = [
        Environment::BiolibApp,
        Environment::Dockerhub,
        Environment::LocalDocker,
        Environment::AppData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BiolibApp => "biolib-app",
            Self::Dockerhub => "dockerhub",
            Self::LocalDocker => "local-docker",
            Self::AppData => "app-data",
        }
    }

    /// Looks up the environment named by an image scheme.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|env| env.as_str() == scheme)
    }

    /// Returns the `<env>://` prefix images in this environment start with.
    pub fn prefix(self) -> String {
        format!("{}://", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module GPU preference (`gpu` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuPreference {
    Disabled,
    Required,
    Preferred,
}

impl GpuPreference {
    pub const ALL: [GpuPreference; 3] = [
        GpuPreference::Disabled,
        GpuPreference::Required,
        GpuPreference::Preferred,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Required => "required",
            Self::Preferred => "preferred",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pref| pref.as_str() == value)
    }
}

/// GPU class attached to GPU-bearing machine tiers.
///
/// Carried as an opaque tag; validation never compares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuType {
    AwsG4,
}

/// Resources behind a machine-tier name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineTier {
    pub name: &'static str,
    pub cpu_in_nano_shares: u64,
    pub memory_in_bytes: u64,
    pub gpu_count: u32,
    pub gpu_type: Option<GpuType>,
}

const fn cpu_tier(name: &'static str, cpu_in_nano_shares: u64, memory_in_bytes: u64) -> MachineTier {
    MachineTier {
        name,
        cpu_in_nano_shares,
        memory_in_bytes,
        gpu_count: 0,
        gpu_type: None,
    }
}

const fn gpu_tier(
    name: &'static str,
    cpu_in_nano_shares: u64,
    memory_in_bytes: u64,
    gpu_count: u32,
) -> MachineTier {
    MachineTier {
        name,
        cpu_in_nano_shares,
        memory_in_bytes,
        gpu_count,
        gpu_type: Some(GpuType::AwsG4),
    }
}

const GB: u64 = 1_000_000_000;
const CORE: u64 = 1_000_000_000;

/// Machine tiers a module may name in `default_machine`.
pub static MACHINE_TIERS: &[MachineTier] = &[
    cpu_tier("cpu.micro", CORE, GB),
    cpu_tier("cpu.small", CORE, 4 * GB),
    cpu_tier("cpu.medium", 2 * CORE, 8 * GB),
    cpu_tier("cpu.large", 4 * CORE, 16 * GB),
    cpu_tier("cpu.xlarge", 8 * CORE, 32 * GB),
    cpu_tier("cpu.2xlarge", 16 * CORE, 64 * GB),
    cpu_tier("cpu.4xlarge", 32 * CORE, 128 * GB),
    cpu_tier("cpu.8xlarge", 64 * CORE, 256 * GB),
    cpu_tier("cpu.16xlarge", 128 * CORE, 512 * GB),
    cpu_tier("cpu.24xlarge", 192 * CORE, 768 * GB),
    cpu_tier("memory.2xlarge", 16 * CORE, 128 * GB),
    gpu_tier("gpu.small", 4 * CORE, 16 * GB, 1),
    gpu_tier("gpu.medium", 4 * CORE, 16 * GB, 1),
    gpu_tier("gpu.large", 8 * CORE, 32 * GB, 1),
    gpu_tier("gpu.xlarge", 16 * CORE, 64 * GB, 1),
    gpu_tier("gpu.2xlarge", 32 * CORE, 128 * GB, 1),
    gpu_tier("aws-g5.12xlarge", 48 * CORE, 192 * GB, 4),
    gpu_tier("aws-g5.48xlarge", 192 * CORE, 768 * GB, 8),
    gpu_tier("aws-g6e.xlarge", 4 * CORE, 32 * GB, 1),
    gpu_tier("aws-g6e.2xlarge", 8 * CORE, 64 * GB, 1),
    gpu_tier("aws-g6e.4xlarge", 16 * CORE, 128 * GB, 1),
    gpu_tier("aws-g6e.8xlarge", 32 * CORE, 256 * GB, 1),
    gpu_tier("aws-g6e.16xlarge", 64 * CORE, 512 * GB, 1),
    cpu_tier("aws-r6a.32xlarge", 128 * CORE, 1024 * GB),
    cpu_tier("small", CORE, 2 * GB),
    cpu_tier("medium", 2 * CORE, 4 * GB),
    cpu_tier("large", 4 * CORE, 8 * GB),
    gpu_tier("gpu-small", 2 * CORE, 4 * GB, 1),
];

/// Looks up a machine tier by name.
pub fn machine_tier(name: &str) -> Option<&'static MachineTier> {
    MACHINE_TIERS.iter().find(|tier| tier.name == name)
}

/// A platform-managed executor and the versions it ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    pub name: &'static str,
    pub versions: &'static [&'static str],
    pub latest: &'static str,
}

impl Executor {
    /// Returns `true` if `version` is shipped or is the wildcard.
    pub fn supports(&self, version: &str) -> bool {
        version == EXECUTOR_VERSION_WILDCARD || self.versions.contains(&version)
    }

    /// Shipped versions followed by the wildcard.
    pub fn supported_versions(&self) -> Vec<&'static str> {
        self.versions
            .iter()
            .copied()
            .chain(std::iter::once(EXECUTOR_VERSION_WILDCARD))
            .collect()
    }
}

/// Executors available as `biolib-app://biolib/<name>:<version>` images.
pub static EXECUTORS: &[Executor] = &[
    Executor {
        name: "python",
        versions: &["3.7", "3.8", "3.9", "3.10"],
        latest: "3.10",
    },
    Executor {
        name: "r",
        versions: &["4.0", "4.1", "4.2"],
        latest: "4.2",
    },
    Executor {
        name: "node",
        versions: &["14", "16", "18"],
        latest: "18",
    },
];

/// Legacy executor names and the executor each maps to.
pub const LEGACY_EXECUTOR_ALIASES: &[(&str, &str)] =
    &[("python", "python"), ("r", "r"), ("node", "node")];

/// Looks up a managed executor by name.
pub fn executor(name: &str) -> Option<&'static Executor> {
    EXECUTORS.iter().find(|executor| executor.name == name)
}

/// Looks up the executor a legacy executor name refers to.
pub fn legacy_executor(name: &str) -> Option<&'static Executor> {
    LEGACY_EXECUTOR_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .and_then(|(_, target)| executor(target))
}

/// Formats choices as a bracketed, quoted list: `['a', 'b']`.
pub(crate) fn format_choices<I, S>(choices: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = choices
        .into_iter()
        .map(|choice| format!("'{}'", choice.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_tier_lookup() {
        let tier = machine_tier("gpu.small").unwrap();
        assert_eq!(tier.gpu_count, 1);
        assert!(tier.gpu_type.is_some());
        assert!(machine_tier("cpu.medium").unwrap().gpu_type.is_none());
        assert!(machine_tier("cpu.huge").is_none());
    }

    #[test]
    fn test_machine_tier_names_are_unique() {
        for (idx, tier) in MACHINE_TIERS.iter().enumerate() {
            assert!(
                MACHINE_TIERS[idx + 1..].iter().all(|other| other.name != tier.name),
                "duplicate tier {}",
                tier.name
            );
        }
    }

    #[test]
    fn test_executor_versions_include_wildcard() {
        let python = executor("python").unwrap();
        assert!(python.supports("3.9"));
        assert!(python.supports("*"));
        assert!(!python.supports("2.7"));
        assert_eq!(python.supported_versions().last(), Some(&"*"));
        assert!(python.versions.contains(&python.latest));
    }

    #[test]
    fn test_legacy_aliases_resolve() {
        for (alias, _) in LEGACY_EXECUTOR_ALIASES {
            assert!(legacy_executor(alias).is_some(), "{alias} must resolve");
        }
        assert!(legacy_executor("ruby").is_none());
    }

    #[test]
    fn test_environment_from_scheme() {
        assert_eq!(Environment::from_scheme("app-data"), Some(Environment::AppData));
        assert_eq!(Environment::from_scheme("docker"), None);
        assert_eq!(Environment::BiolibApp.prefix(), "biolib-app://");
    }

    #[test]
    fn test_format_choices() {
        assert_eq!(
            format_choices(STDOUT_RENDER_TYPES),
            "['text', 'markdown', 'html']"
        );
        assert_eq!(format_choices(Vec::<String>::new()), "[]");
    }
}
