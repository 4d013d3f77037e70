use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use simplimedi::{
    catalog, chat,
    config::Config,
    logging,
    vectara::{
        CorpusDefinition, CorpusTarget, Credential, QueryRequest, UploadRequest, VectaraClient,
    },
};

#[derive(Parser)]
#[command(
    name = "simplimedi-cli",
    about = "Upload medical records to Vectara and query them from the terminal"
)]
struct Cli {
    /// Authenticate with the personal API key instead of an OAuth2 token.
    #[arg(long, global = true)]
    api_key: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request an OAuth2 access token and print it.
    Token,
    /// Upload a single document to the configured corpus.
    Upload { file: PathBuf },
    /// Upload every file in a directory to the configured corpus.
    UploadDir { dir: PathBuf },
    /// Ask a question and print the generated summary.
    Query {
        text: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Print the parsed result as JSON instead of the chat reply.
        #[arg(long)]
        json: bool,
    },
    /// Create a corpus (always authenticated with the API key).
    CreateCorpus {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    logging::init_cli_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    let client = VectaraClient::from_config(&config).context("failed to build Vectara client")?;

    match cli.command {
        Command::Token => {
            let token = client
                .fetch_token()
                .await
                .context("token request failed")?;
            println!("{}", token.as_str());
        }
        Command::Upload { file } => {
            let credential = credential(&client, &config, cli.api_key).await?;
            let request = UploadRequest::from_path(CorpusTarget::indexing(&config), file);
            let receipt = client
                .upload_file(&credential, &request)
                .await
                .with_context(|| format!("failed to upload {}", request.path.display()))?;
            println!("{}: {:?}", receipt.file_name, receipt.disposition);
        }
        Command::UploadDir { dir } => {
            let target = CorpusTarget::indexing(&config);
            let outcome = if cli.api_key {
                let credential = credential(&client, &config, true).await?;
                client.upload_directory_with(&credential, &target, &dir).await
            } else {
                client.upload_files_in_directory(&target, &dir).await
            };
            let uploads = outcome.with_context(|| format!("failed to upload {}", dir.display()))?;

            let mut failed = 0usize;
            for upload in &uploads {
                match &upload.result {
                    Ok(receipt) => println!("{}: {:?}", upload.path.display(), receipt.disposition),
                    Err(err) => {
                        failed += 1;
                        println!("{}: failed ({err})", upload.path.display());
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} uploads failed", uploads.len());
            }
        }
        Command::Query {
            text,
            language,
            model,
            json,
        } => {
            let language = match language.as_deref() {
                Some(input) => catalog::resolve_language(input)
                    .ok_or_else(|| anyhow!("unknown language: {input}"))?,
                None => config.default_language.as_str(),
            };
            let summarizer = match model.as_deref() {
                Some(input) => {
                    catalog::resolve_model(input).ok_or_else(|| anyhow!("unknown model: {input}"))?
                }
                None => config.default_summarizer.as_str(),
            };

            let mut request = QueryRequest::new(CorpusTarget::querying(&config), text)
                .with_language(language)
                .with_summarizer(summarizer);
            request.num_results = config.query_num_results;
            request.max_summarized_results = config.query_max_summarized_results;
            request.lambda = config.query_lambda;

            let credential = credential(&client, &config, cli.api_key).await?;
            let result = client
                .query_corpus(&credential, &request)
                .await
                .context("query failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{}",
                    chat::format_reply(&result.summary, result.factual_consistency)
                );
            }
        }
        Command::CreateCorpus { name, description } => {
            let credential = Credential::ApiKey(config.api_key.clone());
            let created = client
                .create_corpus(
                    &credential,
                    &config.idx_address,
                    config.customer_id,
                    &CorpusDefinition { name, description },
                )
                .await
                .context("corpus creation failed")?;
            println!("{}", created.corpus_id);
        }
    }
    Ok(())
}

async fn credential(client: &VectaraClient, config: &Config, api_key: bool) -> Result<Credential> {
    if api_key {
        return Ok(Credential::ApiKey(config.api_key.clone()));
    }
    let token = client
        .fetch_token()
        .await
        .context("token request failed")?;
    Ok(Credential::from(token))
}
