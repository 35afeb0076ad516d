//! Configuration for the provider
//!
//! The best way to configure the provider is by using [`Config::default_config`]
//! or by turning on the "cli" feature and parsing an [`Opts`] from flags.

#[cfg(feature = "cli")]
use structopt::StructOpt;

const DEFAULT_CPU: &str = "20";
const DEFAULT_MEMORY: &str = "100Gi";
const DEFAULT_MAX_PODS: u16 = 20;
const DEFAULT_OPERATING_SYSTEM: &str = "linux";

/// The configuration needed for the provider to run properly.
///
/// The capacity values are advertised to the control plane unchanged; they
/// describe what the backing Zun deployment is allowed to hold, not anything
/// measured from it.
#[derive(Clone, Debug)]
pub struct Config {
    /// The name this node registers under
    pub node_name: String,
    /// The operating system advertised for the node
    pub operating_system: String,
    /// CPU capacity advertised to the control plane
    pub cpu: String,
    /// Memory capacity advertised to the control plane
    pub memory: String,
    /// The maximum pods for this provider (reported to apiserver)
    pub max_pods: u16,
}

impl Config {
    /// Returns a Config object set with all of the defaults.
    pub fn default_config() -> anyhow::Result<Self> {
        let hostname = default_hostname()?;
        Ok(Config {
            node_name: sanitize_hostname(&hostname),
            operating_system: DEFAULT_OPERATING_SYSTEM.to_owned(),
            cpu: DEFAULT_CPU.to_owned(),
            memory: DEFAULT_MEMORY.to_owned(),
            max_pods: DEFAULT_MAX_PODS,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config().expect("Could not create default config")
    }
}

/// CLI options that can be configured for the provider
///
/// These can be parsed from args using `Opts::from_args` or flattened into a
/// larger flag set
#[derive(StructOpt, Clone, Debug)]
#[cfg(feature = "cli")]
#[structopt(
    name = "zunlet",
    about = "A kubelet provider for running pods as OpenStack Zun capsules"
)]
pub struct Opts {
    #[structopt(
        long = "node-name",
        env = "ZUNLET_NODE_NAME",
        help = "The name for this node in Kubernetes, defaults to the hostname of this machine"
    )]
    node_name: Option<String>,

    #[structopt(
        long = "os",
        default_value = DEFAULT_OPERATING_SYSTEM,
        env = "ZUNLET_OS",
        help = "The operating system advertised for this node"
    )]
    operating_system: String,

    #[structopt(
        long = "cpu",
        default_value = DEFAULT_CPU,
        env = "ZUNLET_CPU",
        help = "The CPU capacity advertised to the control plane"
    )]
    cpu: String,

    #[structopt(
        long = "memory",
        default_value = DEFAULT_MEMORY,
        env = "ZUNLET_MEMORY",
        help = "The memory capacity advertised to the control plane"
    )]
    memory: String,

    #[structopt(
        long = "max-pods",
        default_value = "20",
        env = "MAX_PODS",
        help = "The maximum pods for this provider (reported to apiserver)"
    )]
    max_pods: u16,
}

#[cfg(feature = "cli")]
impl From<Opts> for Config {
    fn from(opts: Opts) -> Self {
        let node_name = opts.node_name.unwrap_or_else(|| {
            sanitize_hostname(&default_hostname().expect("unable to get default hostname"))
        });
        Config {
            node_name,
            operating_system: opts.operating_system,
            cpu: opts.cpu,
            memory: opts.memory,
            max_pods: opts.max_pods,
        }
    }
}

fn default_hostname() -> anyhow::Result<String> {
    hostname::get()?
        .into_string()
        .map_err(|_| anyhow::anyhow!("invalid utf-8 hostname string"))
}

// Some hostnames (particularly local ones) can have uppercase letters, which is
// disallowed by the DNS spec used in kubernetes naming. This sanitizes those
// names
fn sanitize_hostname(hostname: &str) -> String {
    hostname.to_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hostnames_are_lowercased() {
        assert_eq!("zun-node-1", sanitize_hostname("Zun-Node-1"));
    }

    #[test]
    fn defaults_match_the_advertised_capacity() {
        let config = Config::default_config().expect("default config");
        assert_eq!("20", config.cpu);
        assert_eq!("100Gi", config.memory);
        assert_eq!(20, config.max_pods);
        assert_eq!("linux", config.operating_system);
        assert_eq!(config.node_name, config.node_name.to_lowercase());
    }
}
