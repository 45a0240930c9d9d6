use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, web};
use clap::Parser;
use serde::{Deserialize, Serialize};

use rs_lm_core::{LmError, ModelConfig, ModelRegistry};

/// Command line / environment configuration of the server.
#[derive(Parser, Debug)]
#[command(name = "rs-lm-server")]
#[command(about = "Serve perplexity and probabilities of n-gram models over HTTP")]
struct Args {
	/// Directory containing `.dat` corpora (one model per file)
	#[arg(long, env = "RS_LM_DATA", default_value = "./data")]
	data: String,

	/// Address to bind
	#[arg(long, env = "RS_LM_HOST", default_value = "127.0.0.1")]
	host: String,

	/// Port to bind
	#[arg(long, env = "RS_LM_PORT", default_value = "5000")]
	port: u16,

	/// Model order n
	#[arg(short, long, env = "RS_LM_ORDER", default_value = "3")]
	order: usize,

	/// Additive smoothing strength
	#[arg(short, long, env = "RS_LM_ALPHA", default_value = "1.0")]
	alpha: f64,
}

/// Query parameters of `/v1/perplexity`
#[derive(Deserialize)]
struct PerplexityQuery {
	model: Option<String>,
	text: String,
}

/// Query parameters of `/v1/log_prob`
#[derive(Deserialize)]
struct LogProbQuery {
	model: String,
	context: Option<String>,
	target: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ModelInfo {
	name: String,
	order: usize,
	alpha: f64,
	vocabulary_size: usize,
	contexts: usize,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PerplexityReport {
	model: String,
	perplexity: f64,
	cross_entropy: f64,
	tokens_scored: usize,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct RankEntry {
	model: String,
	perplexity: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct LogProbReport {
	log_prob: f64,
	probability: f64,
}

/// Maps a model error to the matching HTTP status.
fn error_response(error: LmError) -> HttpResponse {
	match error {
		LmError::EmptyEvaluation { .. } | LmError::UnfittedModel => HttpResponse::BadRequest().body(error.to_string()),
		_ => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

fn unknown_model(name: &str) -> HttpResponse {
	HttpResponse::NotFound().body(format!("Model {name} not found"))
}

/// HTTP GET endpoint `/v1/models`
///
/// Lists the loaded models with their diagnostics.
#[get("/v1/models")]
async fn get_models(registry: web::Data<ModelRegistry>) -> impl Responder {
	let infos: Vec<ModelInfo> = registry
		.names()
		.into_iter()
		.filter_map(|name| {
			let model = registry.get(&name)?;
			Some(ModelInfo {
				order: model.order(),
				alpha: model.alpha(),
				vocabulary_size: model.vocabulary_size(),
				contexts: model.context_count(),
				name,
			})
		})
		.collect();
	HttpResponse::Ok().json(infos)
}

/// HTTP GET endpoint `/v1/perplexity`
///
/// With `model`, evaluates `text` against that model.
/// Without it, ranks every loaded model by perplexity (lowest first).
#[get("/v1/perplexity")]
async fn get_perplexity(registry: web::Data<ModelRegistry>, query: web::Query<PerplexityQuery>) -> impl Responder {
	let tokens: Vec<&str> = query.text.split_whitespace().collect();

	let Some(name) = &query.model else {
		return match registry.rank(&tokens) {
			Ok(ranking) => HttpResponse::Ok().json(
				ranking
					.into_iter()
					.map(|(model, perplexity)| RankEntry { model, perplexity })
					.collect::<Vec<_>>(),
			),
			Err(e) => error_response(e),
		};
	};

	let Some(model) = registry.get(name) else {
		return unknown_model(name);
	};
	match model.evaluate(&tokens) {
		Ok(evaluation) => HttpResponse::Ok().json(PerplexityReport {
			model: name.clone(),
			perplexity: evaluation.perplexity(),
			cross_entropy: evaluation.cross_entropy(),
			tokens_scored: evaluation.tokens_scored(),
		}),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/log_prob`
///
/// Smoothed log-probability of `target` after the whitespace-separated `context`.
#[get("/v1/log_prob")]
async fn get_log_prob(registry: web::Data<ModelRegistry>, query: web::Query<LogProbQuery>) -> impl Responder {
	let Some(model) = registry.get(&query.model) else {
		return unknown_model(&query.model);
	};
	let context: Vec<&str> = query.context.as_deref().unwrap_or_default().split_whitespace().collect();

	match model.log_probability(&context, &query.target) {
		Ok(log_prob) => HttpResponse::Ok().json(LogProbReport { log_prob, probability: log_prob.exp() }),
		Err(e) => error_response(e),
	}
}

/// Main entry point for the server.
///
/// Fits (or loads from cache) one model per corpus of the data directory,
/// then serves them read-only: the registry is shared without a lock.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let config = ModelConfig::new(args.order, args.alpha).map_err(std::io::Error::other)?;
	let registry = ModelRegistry::new(&args.data, config).map_err(std::io::Error::other)?;
	log::info!("Serving {} model(s) on {}:{}", registry.len(), args.host, args.port);
	let registry = web::Data::new(registry);

	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET"]))
			.app_data(registry.clone())
			.service(get_models)
			.service(get_perplexity)
			.service(get_log_prob)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use rs_lm_core::NGramModel;

	fn registry() -> web::Data<ModelRegistry> {
		let mut registry = ModelRegistry::empty();
		let mut letters = NGramModel::with_order(2, 1.0).unwrap();
		letters.fit(&["a", "b", "a", "b", "a", "c"]).unwrap();
		registry.insert("letters", letters).unwrap();
		let mut words = NGramModel::with_order(2, 1.0).unwrap();
		words.fit(&["one", "two", "three", "one", "two"]).unwrap();
		registry.insert("words", words).unwrap();
		web::Data::new(registry)
	}

	macro_rules! app {
		() => {
			test::init_service(
				App::new()
					.app_data(registry())
					.service(get_models)
					.service(get_perplexity)
					.service(get_log_prob),
			)
			.await
		};
	}

	#[actix_web::test]
	async fn lists_models() {
		let app = app!();
		let req = test::TestRequest::get().uri("/v1/models").to_request();
		let infos: Vec<ModelInfo> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(infos.len(), 2);
		assert_eq!(infos[0].name, "letters");
		assert_eq!(infos[0].vocabulary_size, 3);
		assert_eq!(infos[0].contexts, 2);
	}

	#[actix_web::test]
	async fn log_prob_of_known_bigram() {
		let app = app!();
		let req = test::TestRequest::get()
			.uri("/v1/log_prob?model=letters&context=a&target=b")
			.to_request();
		let report: LogProbReport = test::call_and_read_body_json(&app, req).await;
		assert!((report.probability - 0.5).abs() < 1e-12);
		assert!((report.log_prob - 0.5_f64.ln()).abs() < 1e-12);
	}

	#[actix_web::test]
	async fn perplexity_of_one_model() {
		let app = app!();
		let req = test::TestRequest::get()
			.uri("/v1/perplexity?model=letters&text=a%20b%20a%20b%20a%20c")
			.to_request();
		let report: PerplexityReport = test::call_and_read_body_json(&app, req).await;
		assert_eq!(report.tokens_scored, 5);
		assert!(report.perplexity.is_finite() && report.perplexity > 1.0);
	}

	#[actix_web::test]
	async fn ranking_without_model() {
		let app = app!();
		let req = test::TestRequest::get().uri("/v1/perplexity?text=one%20two%20three").to_request();
		let ranking: Vec<RankEntry> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(ranking.len(), 2);
		assert_eq!(ranking[0].model, "words");
	}

	#[actix_web::test]
	async fn short_text_is_bad_request() {
		let app = app!();
		let req = test::TestRequest::get().uri("/v1/perplexity?model=letters&text=a").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn unknown_model_is_not_found() {
		let app = app!();
		let req = test::TestRequest::get()
			.uri("/v1/log_prob?model=missing&target=a")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	}
}
