use std::sync::Arc;

use anyhow::{Context, Result};
use structopt::StructOpt;

use tinyes_core::{Document, Keyword, TermQuery};
use tinyes_discovery::{EtcdCoordinationStore, HubProxy, ServiceHub};
use tinyes_sentinel::{Discovery, Sentinel};

#[derive(Debug, StructOpt)]
#[structopt(name = "tinyes-cli", about = "Thin command-line client for a TinyES cluster.")]
struct Args {
    #[structopt(long, use_delimiter = true)]
    etcd_servers: Vec<String>,

    #[structopt(long, default_value = "3")]
    heartbeat_frequency_secs: i64,

    #[structopt(long, default_value = "100")]
    qps: u32,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    Add {
        id: String,
        field: String,
        word: String,
    },
    Delete {
        id: String,
    },
    Search {
        field: String,
        word: String,
    },
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::from_args();
    let store = EtcdCoordinationStore::connect(&args.etcd_servers)
        .await
        .context("failed to connect to coordination store")?;
    let hub = ServiceHub::get_or_init(Arc::new(store), args.heartbeat_frequency_secs);
    let proxy = HubProxy::get_or_init(hub, args.qps);
    let sentinel = Sentinel::new(Discovery::Proxied(proxy));

    match args.command {
        Command::Add { id, field, word } => {
            let doc = Document::new(id, 0, vec![Keyword::new(field, word)], bytes::Bytes::new());
            let n = sentinel.add_doc(doc).await?;
            println!("added {n} document(s)");
        }
        Command::Delete { id } => {
            let n = sentinel.delete_doc(&id).await;
            println!("deleted {n} document(s)");
        }
        Command::Search { field, word } => {
            let results = sentinel
                .search(&TermQuery::leaf(field, word), 0, 0, &[])
                .await;
            for doc in results {
                println!("{}", doc.id);
            }
        }
        Command::Count => {
            println!("{}", sentinel.count().await);
        }
    }

    sentinel.close().await;
    Ok(())
}
