use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use soto::llm::OpenAiClient;
use soto::memory::json_file::JsonFileStore;
use soto::rag::{index_builder, RagEngine};
use soto::service::AnswerService;

/// Terminal loop against the same answer pipeline as the API, with the
/// single-file message memory.
#[derive(Parser, Debug)]
#[command(name = "soto-chat")]
#[command(about = "Chat with soto from the terminal")]
struct Args {
    /// Memory file (JSON array of messages)
    #[arg(long, default_value = "./soto_memoria.json")]
    memory_file: String,

    /// User id recorded for this session
    #[arg(long, default_value = "default")]
    user: String,

    /// Qdrant server URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334")]
    qdrant_url: String,

    /// Qdrant collection name
    #[arg(long, env = "SOTO_COLLECTION", default_value = "soto_obra")]
    collection: String,

    /// Document directory, indexed on first run
    #[arg(long, env = "SOTO_DATA_DIR", default_value = "./data")]
    data_dir: String,

    /// OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "SOTO_MODEL", default_value = "gpt-3.5-turbo")]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let store = Arc::new(JsonFileStore::open(std::path::Path::new(&args.memory_file))?);
    let engine = RagEngine::new(&args.qdrant_url, &args.collection).await?;
    index_builder::ensure_index(&engine, std::path::Path::new(&args.data_dir)).await?;

    let generator = OpenAiClient::new(args.base_url.clone(), args.api_key.clone(), args.model.clone());
    let service = AnswerService::new(store, Arc::new(engine), Arc::new(generator), 5, 3);

    println!("💬 soto está listo con personalidad y memoria. Escribe 'salir' para terminar.");

    let stdin = std::io::stdin();
    loop {
        print!("Tú: ");
        std::io::stdout().flush()?;

        let mut pregunta = String::new();
        if stdin.lock().read_line(&mut pregunta)? == 0 {
            break;
        }
        let pregunta = pregunta.trim();

        if pregunta.eq_ignore_ascii_case("salir") {
            println!("🧠 Memoria guardada. ¡Hasta la próxima!");
            break;
        }
        if pregunta.is_empty() {
            continue;
        }

        match service.ask(&args.user, pregunta).await {
            Ok(respuesta) => println!("soto: {}\n", respuesta),
            Err(e) => eprintln!("[error] {}\n", e),
        }
    }

    Ok(())
}
