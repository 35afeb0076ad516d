use structopt::StructOpt;
use tracing::info;
use zun_client::{AuthOptions, Client};
use zun_provider::config::{Config, Opts};
use zun_provider::{Provider, ZunProvider};

#[derive(StructOpt)]
#[structopt(
    name = "zunlet",
    about = "A kubelet for running pods as OpenStack Zun capsules"
)]
struct Zunlet {
    #[structopt(flatten)]
    provider: Opts,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Look up the observed state of a pod and print it
    Get {
        /// Namespace of the pod
        namespace: String,
        /// Name of the pod
        name: String,
    },
    /// Print the node capacity advertised to the control plane
    Capacity,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Zunlet::from_args();
    let config = Config::from(opts.provider);

    // Credentials and the region come from the standard OS_* environment
    // variables, the same ones the OpenStack CLI reads.
    let auth = AuthOptions::from_env()?;
    let client = Client::new(&auth).await?;
    let provider = ZunProvider::new(client, &config);
    info!(
        node_name = %provider.node_name(),
        os = %provider.operating_system(),
        "provider ready"
    );

    match opts.command {
        Command::Get { namespace, name } => {
            let pod = provider.pod(&namespace, &name).await?;
            print!("{}", serde_yaml::to_string(pod.as_kube_pod())?);
        }
        Command::Capacity => {
            print!("{}", serde_yaml::to_string(&provider.capacity())?);
        }
    }

    Ok(())
}
