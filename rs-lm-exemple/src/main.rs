use rs_lm_core::io::read_tokens;
use rs_lm_core::{LmError, ModelConfig, NGramModel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Corpus path can be given as first argument, tokens are whitespace separated
    let corpus = std::env::args().nth(1).unwrap_or_else(|| "./data/english.dat".to_owned());
    let tokens = read_tokens(&corpus)?;

    // Keep the last 10% of the stream as held-out text
    let split = tokens.len() * 9 / 10;
    let (train, held_out) = tokens.split_at(split);

    // Order and smoothing are validated when the config is built
    let config = ModelConfig::new(3, 1.0)?;
    match ModelConfig::new(0, 1.0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Rejected config: {e}"),
    }

    // An unfitted model refuses to answer instead of returning a made-up number
    let mut model = NGramModel::new(config);
    if let Err(LmError::UnfittedModel) = model.perplexity(held_out) {
        println!("Unfitted model cannot be evaluated");
    }

    // Counting is spread over all cores, the tables match a sequential fit
    model.fit_parallel(train)?;

    println!("Order: {}", model.order());
    println!("Alpha: {}", model.alpha());
    println!("Vocabulary size: {}", model.vocabulary_size());
    println!("Contexts: {}", model.context_count());
    println!("Distinct n-grams: {}", model.ngram_count());

    println!("Train perplexity: {:.3}", model.perplexity(train)?);
    match model.evaluate(held_out) {
        Ok(evaluation) => println!(
            "Held-out perplexity: {:.3} ({} tokens, {:.3} nats/token)",
            evaluation.perplexity(),
            evaluation.tokens_scored(),
            evaluation.cross_entropy()
        ),
        Err(e) => println!("Held-out text too short: {e}"),
    }

    // Probability of a continuation after the first context of the corpus
    if let [first, second, third, ..] = train {
        let p = model.probability(&[first, second], third)?;
        println!("P({third} | {first} {second}) = {p:.5}");
    }

    Ok(())
}
