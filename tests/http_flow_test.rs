use anyhow::Result;
use httpmock::prelude::*;
use sheet_fixer::{
    AnalyzePipeline, ExportOptions, FixEngine, FixError, HttpCorrectionService, InputSource,
    LocalStorage, UploadPipeline,
};
use std::time::Duration;
use tempfile::TempDir;

fn analyze_body() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {"Nome": "ana souza", "CPF": "12345678909", "Valor": "1234.5"},
            {"Nome": "Bia Lima", "CPF": "111.111.111-11", "Valor": "7"}
        ],
        "columns": ["Nome", "CPF", "Valor"],
        "issues": [
            {"row": 0, "column": 0, "column_name": "Nome", "value": "ana souza",
             "issue_type": "text_case", "suggested_value": "Ana Souza",
             "description": "Texto não está em formato título como o padrão da coluna"},
            {"row": 0, "column": 1, "column_name": "CPF", "value": "12345678909",
             "issue_type": "cpf_format", "suggested_value": "123.456.789-09",
             "description": "Formatação de CPF inconsistente: 12345678909"},
            {"row": 1, "column": 1, "column_name": "CPF", "value": "111.111.111-11",
             "issue_type": "invalid_cpf", "suggested_value": null,
             "description": "CPF inválido: 111.111.111-11"},
            {"row": 0, "column": 2, "column_name": "Valor", "value": "1234.5",
             "issue_type": "number_format", "suggested_value": "1.234,5"}
        ]
    })
}

fn options() -> ExportOptions {
    ExportOptions {
        filename: "dados_corrigidos.csv".to_string(),
        delimiter: None,
    }
}

#[tokio::test]
async fn test_analyze_file_and_export() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("out").display().to_string();
    let input = temp_dir.path().join("clientes.csv");
    std::fs::write(&input, "Nome,CPF,Valor\nana souza,12345678909,1234.5\n")?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/analyze")
            .body_contains("name=\"file\"")
            .body_contains("filename=\"clientes.csv\"");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(analyze_body());
    });

    let service = HttpCorrectionService::new(server.base_url(), Duration::from_secs(5))?;
    let pipeline = AnalyzePipeline::new(
        LocalStorage::new(output_path.clone()),
        service,
        InputSource::File(input),
        options(),
    );

    let written = FixEngine::new(pipeline).run().await?;
    api_mock.assert();

    assert!(written.ends_with("dados_corrigidos.csv"));
    let csv = std::fs::read_to_string(&written)?;
    assert_eq!(
        csv,
        "Nome,CPF,Valor\nAna Souza,123.456.789-09,\"1.234,5\"\nBia Lima,111.111.111-11,7\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_analyze_text_and_push_corrections() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().display().to_string();

    let server = MockServer::start();
    let analyze_mock = server.mock(|when, then| {
        when.method(POST).path("/api/analyze").body_contains("name=\"data\"");
        then.status(200).json_body(analyze_body());
    });
    let apply_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/apply_corrections")
            .body_contains("\"suggested_value\":\"123.456.789-09\"")
            .body_contains("\"columns\":[\"Nome\",\"CPF\",\"Valor\"]");
        then.status(200).json_body(serde_json::json!({
            "corrected_data": [
                {"Nome": "Ana Souza", "CPF": "123.456.789-09", "Valor": 1234.5},
                {"Nome": "Bia Lima", "CPF": "111.111.111-11", "Valor": 7}
            ]
        }));
    });

    let service = HttpCorrectionService::new(server.base_url(), Duration::from_secs(5))?;
    let pipeline = AnalyzePipeline::new(
        LocalStorage::new(output_path.clone()),
        service,
        InputSource::Text("Nome,CPF,Valor\nana souza,12345678909,1234.5\n".to_string()),
        ExportOptions {
            filename: "dados_corrigidos.csv".to_string(),
            delimiter: Some(';'),
        },
    )
    .push_to_server(true);

    let written = FixEngine::new(pipeline).run().await?;
    analyze_mock.assert();
    apply_mock.assert();

    let csv = std::fs::read_to_string(&written)?;
    assert_eq!(
        csv,
        "Nome;CPF;Valor\nAna Souza;123.456.789-09;1234.5\nBia Lima;111.111.111-11;7\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_analyze_server_error_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("out");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api/analyze");
        then.status(400)
            .json_body(serde_json::json!({"error": "Nenhum dado fornecido"}));
    });

    let service = HttpCorrectionService::new(server.base_url(), Duration::from_secs(5))?;
    let pipeline = AnalyzePipeline::new(
        LocalStorage::new(output_path.display().to_string()),
        service,
        InputSource::Text("A\n1".to_string()),
        options(),
    );

    let err = FixEngine::new(pipeline).run().await.unwrap_err();
    api_mock.assert();
    assert!(matches!(err, FixError::HttpStatus { status: 400, .. }));
    assert!(!output_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_upload_and_correct_flow() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("planilha.csv");
    std::fs::write(&input, "DataNascimento,CPF,Valor\n1990-01-02,123,1,5\n")?;
    let output_path = temp_dir.path().join("downloads").display().to_string();

    let server = MockServer::start();
    let upload_mock = server.mock(|when, then| {
        when.method(POST).path("/upload").body_contains("filename=\"planilha.csv\"");
        then.status(200).json_body(serde_json::json!({
            "filename": "planilha.csv",
            "issues": [{"linha": 1, "erros": {"CPF": "CPF inválido"}}]
        }));
    });
    let correct_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/correct")
            .json_body(serde_json::json!({"filename": "planilha.csv"}));
        then.status(200)
            .header("Content-Type", "text/csv")
            .body("DataNascimento,CPF,Valor\n02/01/1990,INVÁLIDO,1.50\n");
    });

    let service = HttpCorrectionService::new(server.base_url(), Duration::from_secs(5))?;
    let pipeline = UploadPipeline::new(LocalStorage::new(output_path), service, input);

    let written = FixEngine::new(pipeline).run().await?;
    upload_mock.assert();
    correct_mock.assert();

    assert!(written.ends_with("corrigido_planilha.csv"));
    assert_eq!(
        std::fs::read_to_string(&written)?,
        "DataNascimento,CPF,Valor\n02/01/1990,INVÁLIDO,1.50\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // Port 9 (discard) is expected to refuse connections on test hosts
    let service = HttpCorrectionService::new("http://127.0.0.1:9", Duration::from_secs(2))?;
    let pipeline = AnalyzePipeline::new(
        LocalStorage::new(temp_dir.path().display().to_string()),
        service,
        InputSource::Text("A\n1".to_string()),
        options(),
    );

    let err = FixEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, FixError::ApiError(_)));
    Ok(())
}
