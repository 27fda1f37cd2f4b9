use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sqlrag_cli::{EmbeddingBackend, GenerationResponse, Method, ServiceConfig, SqlRagService};

#[derive(Parser, Debug)]
#[command(name = "sqlrag")]
#[command(version, about = "Translate a natural-language question into a read-only SQL query", long_about = None)]
struct Cli {
    /// Natural-language question
    query: String,

    /// Database schema description
    schema: String,

    /// Generation strategy
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Number of knowledge chunks to retrieve
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Knowledge base document [default: knowledge/sql_knowledge_base.txt, relative to the working directory]
    #[arg(long)]
    knowledge_file: Option<PathBuf>,

    /// Directory holding the persisted vector index [default: sql_vector_db, relative to the working directory]
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Embedding backend for the vector index
    #[arg(long, value_enum)]
    embeddings: Option<EmbeddingsArg>,

    /// Reject queries with write keywords, comments, semicolons or UNION
    #[arg(long)]
    strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    Rag,
    Direct,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Rag => Method::Rag,
            MethodArg::Direct => Method::Direct,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EmbeddingsArg {
    Local,
    Gemini,
}

impl From<EmbeddingsArg> for EmbeddingBackend {
    fn from(arg: EmbeddingsArg) -> Self {
        match arg {
            EmbeddingsArg::Local => EmbeddingBackend::Local,
            EmbeddingsArg::Gemini => EmbeddingBackend::Gemini,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

impl Cli {
    fn method(&self) -> Method {
        self.method.map(Method::from).unwrap_or_default()
    }

    /// Command-line flags win over the environment
    fn apply(&self, config: &mut ServiceConfig) {
        config.method = self.method();
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(path) = &self.knowledge_file {
            config.knowledge_file = path.clone();
        }
        if let Some(dir) = &self.index_dir {
            config.index_dir = dir.clone();
        }
        if let Some(backend) = self.embeddings {
            config.embeddings = backend.into();
        }
        config.strict |= self.strict;
    }
}

fn log_filter(verbose: u8) -> EnvFilter {
    let directives = match verbose {
        0 => "warn",
        1 => "warn,sqlrag=info,sqlrag_cli=info,sqlrag_rag=info,sqlrag_gemini=info",
        _ => "info,sqlrag=debug,sqlrag_cli=debug,sqlrag_rag=debug,sqlrag_gemini=debug,sqlrag_core=debug",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn render(response: &GenerationResponse, format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(response)?),
        Format::Text => Ok(match (&response.query, &response.error) {
            (Some(sql), _) => format!("{} {}", "→".green(), sql.bold()),
            (None, error) => format!(
                "{} {}",
                "❌".red(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let response = match ServiceConfig::from_env() {
        Ok(mut config) => {
            cli.apply(&mut config);
            tracing::debug!(?config.method, index_dir = %config.index_dir.display(), "starting");
            SqlRagService::new(config)
                .respond(&cli.query, &cli.schema)
                .await
        }
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            GenerationResponse::failure(e, cli.method())
        }
    };

    match render(&response, cli.format) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("failed to render result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sqlrag_cli::Error;

    #[test]
    fn test_two_positionals_required() {
        let err = Cli::try_parse_from(["sqlrag", "only a question"]).unwrap_err();
        assert!(err.use_stderr());

        let cli = Cli::try_parse_from(["sqlrag", "How many users?", "Table: users"]).unwrap();
        assert_eq!(cli.query, "How many users?");
        assert_eq!(cli.method(), Method::Rag);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::try_parse_from([
            "sqlrag",
            "q",
            "s",
            "--method",
            "direct",
            "-k",
            "2",
            "--index-dir",
            "/tmp/idx",
            "--embeddings",
            "gemini",
            "--strict",
        ])
        .unwrap();

        let mut config = ServiceConfig::from_lookup(|key| {
            match key {
                "GEMINI_API_KEY" => Some("k".to_string()),
                "SQLRAG_TOP_K" => Some("8".to_string()),
                _ => None,
            }
        })
        .unwrap();
        cli.apply(&mut config);

        assert_eq!(config.method, Method::Direct);
        assert_eq!(config.top_k, 2);
        assert_eq!(config.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.embeddings, EmbeddingBackend::Gemini);
        assert!(config.strict);
    }

    #[test]
    fn test_path_help_names_working_directory() {
        let command = Cli::command();
        for id in ["knowledge_file", "index_dir"] {
            let arg = command.get_arguments().find(|a| a.get_id() == id).unwrap();
            let help = arg.get_help().unwrap().to_string();
            assert!(help.contains("relative to the working directory"), "{id}: {help}");
        }
    }

    #[test]
    fn test_json_output_shape() {
        let ok = GenerationResponse::success("SELECT COUNT(*) FROM users".to_string(), Method::Rag);
        insta::assert_snapshot!(render(&ok, Format::Json).unwrap(), @r#"
        {
          "success": true,
          "query": "SELECT COUNT(*) FROM users",
          "method": "RAG"
        }
        "#);

        let failed = GenerationResponse::failure(
            Error::Configuration("GEMINI_API_KEY not found in environment variables".to_string()),
            Method::Rag,
        );
        insta::assert_snapshot!(render(&failed, Format::Json).unwrap(), @r#"
        {
          "success": false,
          "method": "RAG",
          "error": "Configuration error: GEMINI_API_KEY not found in environment variables"
        }
        "#);
    }

    #[test]
    fn test_text_output() {
        colored::control::set_override(false);
        let ok = GenerationResponse::success("SELECT 1".to_string(), Method::Direct);
        assert_eq!(render(&ok, Format::Text).unwrap(), "→ SELECT 1");
    }
}
