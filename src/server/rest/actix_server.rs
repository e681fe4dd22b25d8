//! Implementation of the actix server.

use actix_web::{
    get,
    middleware::Logger,
    post,
    web::{self, Json},
    App, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::flags::{schema::Variant, Flag, FlagDeriver, ViewContext};

use super::Args;

/// Request body of "/api/v1/flags".
#[derive(Deserialize, Debug)]
struct DeriveFlagsRequest {
    /// The page the variants are shown on.
    context: ViewContext,
    /// Variants, consequences ordered by severity.
    #[serde(default)]
    variants: Vec<Variant>,
}

/// Flags of one variant.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct VariantFlags {
    variant_id: String,
    flags: Vec<String>,
}

/// Result type of "/api/v1/flags".
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct DeriveFlagsResponse {
    results: Vec<VariantFlags>,
}

/// Derive the flags of the given variants in the given context.
///
/// Requests with an unknown context type are rejected by the JSON extractor.
#[post("/api/v1/flags")]
async fn derive_flags(request: Json<DeriveFlagsRequest>) -> impl Responder {
    let DeriveFlagsRequest { context, variants } = request.into_inner();
    tracing::debug!(
        "deriving flags for {} variants in context {:?}",
        variants.len(),
        &context
    );
    let deriver = FlagDeriver::new(context);
    let results = variants
        .iter()
        .map(|variant| VariantFlags {
            variant_id: variant.variant_id.clone(),
            flags: deriver.derive(variant),
        })
        .collect::<Vec<_>>();
    Json(DeriveFlagsResponse { results })
}

/// Entry of "/api/v1/flags/vocabulary".
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct FlagInfo {
    flag: Flag,
    label: String,
}

/// List the flags that may be derived.
#[get("/api/v1/flags/vocabulary")]
async fn flag_vocabulary() -> impl Responder {
    Json(
        Flag::iter()
            .map(|flag| FlagInfo {
                flag,
                label: flag.label().to_string(),
            })
            .collect::<Vec<_>>(),
    )
}

/// Configure the routes of the server.
fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(derive_flags).service(flag_vocabulary);
}

#[actix_web::main]
pub async fn main(args: &Args) -> std::io::Result<()> {
    HttpServer::new(|| App::new().configure(configure).wrap(Logger::default()))
        .bind((args.listen_host.as_str(), args.listen_port))?
        .run()
        .await
}

#[cfg(test)]
mod test {
    use actix_web::{http::StatusCode, test, App};
    use pretty_assertions::assert_eq;

    use super::{configure, DeriveFlagsResponse, FlagInfo, VariantFlags};
    use crate::flags::Flag;

    fn variants() -> serde_json::Value {
        serde_json::json!([
            {
                "variant_id": "1-55505510-G-T",
                "flags": ["lcr"],
                "transcript_consequences": [
                    {
                        "gene_id": "G1",
                        "transcript_id": "T1",
                        "major_consequence": "stop_gained",
                        "lof": "LC",
                        "lof_flags": true,
                    },
                    {
                        "gene_id": "G1",
                        "transcript_id": "T2",
                        "major_consequence": "missense_variant",
                        "lof": null,
                    },
                ],
            },
            {
                "variant_id": "1-55505600-C-CT",
                "transcript_consequences": [
                    {
                        "gene_id": "G1",
                        "transcript_id": "T1",
                        "major_consequence": "frameshift_variant",
                        "lof": null,
                    },
                ],
            },
        ])
    }

    #[rstest::rstest]
    #[case(
        serde_json::json!({"type": "gene", "geneId": "G1"}),
        vec![vec!["lcr", "lc_lof", "lof_flag"], vec!["nc_transcript"]]
    )]
    #[case(
        serde_json::json!({"type": "region", "chrom": "1", "start": 55505000, "stop": 55506000}),
        vec![vec!["lcr", "lc_lof", "lof_flag"], vec!["nc_transcript"]]
    )]
    #[case(
        serde_json::json!({"type": "transcript", "transcriptId": "T2"}),
        vec![vec!["lcr"], vec![]]
    )]
    #[actix_web::test]
    async fn derive_flags(#[case] context: serde_json::Value, #[case] expected: Vec<Vec<&str>>) {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/flags")
            .set_json(serde_json::json!({"context": context, "variants": variants()}))
            .to_request();

        let resp: DeriveFlagsResponse = test::call_and_read_body_json(&app, req).await;

        let expected = DeriveFlagsResponse {
            results: vec!["1-55505510-G-T", "1-55505600-C-CT"]
                .into_iter()
                .zip(expected)
                .map(|(variant_id, flags)| VariantFlags {
                    variant_id: variant_id.to_string(),
                    flags: flags.into_iter().map(String::from).collect(),
                })
                .collect(),
        };
        assert_eq!(resp, expected);
    }

    #[actix_web::test]
    async fn derive_flags_unknown_context() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/flags")
            .set_json(serde_json::json!({
                "context": {"type": "exon", "exonId": "E1"},
                "variants": variants(),
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn derive_flags_legacy_and_unknown_terms() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/flags")
            .set_json(serde_json::json!({
                "context": {"type": "gene", "geneId": "G1"},
                "variants": [
                    {
                        "variant_id": "1-1-A-G",
                        "transcript_consequences": [{
                            "gene_id": "G1",
                            "transcript_id": "T1",
                            "major_consequence": "initiator_codon_variant",
                            "lof": "LC",
                        }],
                    },
                    {
                        "variant_id": "1-2-A-G",
                        "transcript_consequences": [{
                            "gene_id": "G1",
                            "transcript_id": "T1",
                            "major_consequence": "some_future_variant",
                        }],
                    },
                ],
            }))
            .to_request();

        let resp: DeriveFlagsResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            resp.results
                .iter()
                .map(|result| result.flags.clone())
                .collect::<Vec<_>>(),
            vec![vec![String::from("lc_lof")], vec![]]
        );
    }

    #[actix_web::test]
    async fn derive_flags_region_bounds_rejected() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/flags")
            .set_json(serde_json::json!({
                "context": {"type": "region", "chrom": "1", "start": 200, "stop": 100},
                "variants": variants(),
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn flag_vocabulary() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/flags/vocabulary")
            .to_request();

        let resp: Vec<FlagInfo> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            resp.iter().map(|info| info.flag).collect::<Vec<_>>(),
            vec![Flag::LcLof, Flag::LofFlag, Flag::NcTranscript, Flag::OsLof]
        );
        assert_eq!(resp[0].label, "Low-confidence pLoF");
    }
}
