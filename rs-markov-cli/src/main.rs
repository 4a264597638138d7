use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use rs_markov_core::model::corpus_model::CorpusModel;
use rs_markov_core::model::generation_input::GenerationInput;
use rs_markov_core::model::generator::Generator;

/// Trains a trigram model on a folder of texts and writes generated prose.
#[derive(Parser, Debug)]
#[command(name = "rs-markov", version, about)]
struct Args {
    /// Folder whose files (recursively) form the training corpus
    corpus: PathBuf,

    /// File receiving the generated text
    output: PathBuf,

    /// Generation ends at the first sentence end after this many tokens
    min_length: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Abort if a run draws more tokens than this without finishing
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Model cache: loaded when present, written after training otherwise
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Either reuse the cached statistics or train from scratch
    let model = match &args.model {
        Some(cache) => CorpusModel::load_or_train(&args.corpus, cache)?,
        None => CorpusModel::from_folder(&args.corpus)?,
    };

    let mut input = GenerationInput::new(args.min_length);
    input.seed = args.seed;
    input.set_max_tokens(args.max_tokens)?;

    // Nothing is written unless generation succeeds
    let text = Generator::new(&model).generate(&input)?;
    fs::write(&args.output, &text)?;
    info!("Wrote {} bytes to {}", text.len(), args.output.display());

    Ok(())
}
