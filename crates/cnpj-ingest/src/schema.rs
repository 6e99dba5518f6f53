//! Store schema bootstrap
//!
//! Creates the target tables and indices. All DDL is `IF NOT EXISTS`, so
//! bootstrapping an existing store is a no-op. Search indices are split
//! out so they can be created after bulk ingestion rather than before it.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Target tables, keyed by each entity's natural key.
///
/// Establishment/partner registry ids reference companies only softly:
/// files are processed independently, so parents are not required to
/// exist at write time.
const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS empresas (
        cnpj_basico TEXT PRIMARY KEY,
        razao_social TEXT,
        natureza_juridica TEXT,
        qualificacao_responsavel TEXT,
        capital_social REAL,
        porte_empresa TEXT,
        ente_federativo TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS estabelecimentos (
        cnpj_basico TEXT,
        cnpj_ordem TEXT,
        cnpj_dv TEXT,
        cnpj_completo TEXT GENERATED ALWAYS AS (cnpj_basico || cnpj_ordem || cnpj_dv) VIRTUAL,
        nome_fantasia TEXT,
        situacao_cadastral TEXT,
        data_situacao_cadastral TEXT,
        motivo_situacao_cadastral TEXT,
        cidade_exterior TEXT,
        pais TEXT,
        data_inicio_atividade TEXT,
        cnae_principal TEXT,
        cnaes_secundarios TEXT,
        tipo_logradouro TEXT,
        logradouro TEXT,
        numero TEXT,
        complemento TEXT,
        bairro TEXT,
        cep TEXT,
        uf TEXT,
        municipio TEXT,
        ddd1 TEXT,
        telefone1 TEXT,
        ddd2 TEXT,
        telefone2 TEXT,
        email TEXT,
        PRIMARY KEY (cnpj_basico, cnpj_ordem, cnpj_dv)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS socios (
        cnpj_basico TEXT NOT NULL,
        identificador_socio TEXT,
        nome_socio TEXT,
        cnpj_cpf_socio TEXT NOT NULL,
        qualificacao_socio TEXT NOT NULL,
        data_entrada_sociedade TEXT,
        pais TEXT,
        representante_legal TEXT,
        nome_representante TEXT,
        qualificacao_representante TEXT,
        faixa_etaria TEXT,
        PRIMARY KEY (cnpj_basico, cnpj_cpf_socio, qualificacao_socio)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS simples (
        cnpj_basico TEXT PRIMARY KEY,
        opcao_simples INTEGER NOT NULL,
        data_opcao_simples TEXT,
        data_exclusao_simples TEXT,
        opcao_mei INTEGER NOT NULL,
        data_opcao_mei TEXT,
        data_exclusao_mei TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cnae (
        codigo TEXT PRIMARY KEY,
        descricao TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS motivos (
        codigo TEXT PRIMARY KEY,
        descricao TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS municipios (
        codigo TEXT PRIMARY KEY,
        nome TEXT NOT NULL,
        uf TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS naturezas_juridicas (
        codigo TEXT PRIMARY KEY,
        descricao TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paises (
        codigo TEXT PRIMARY KEY,
        nome TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS qualificacoes (
        codigo TEXT PRIMARY KEY,
        descricao TEXT NOT NULL
    )
    "#,
];

/// Search indices, created after ingestion
const INDICES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_cnpj_completo ON estabelecimentos(cnpj_completo)",
    "CREATE INDEX IF NOT EXISTS idx_razao_social ON empresas(razao_social)",
    "CREATE INDEX IF NOT EXISTS idx_situacao_cadastral ON estabelecimentos(situacao_cadastral)",
    "CREATE INDEX IF NOT EXISTS idx_uf ON estabelecimentos(uf)",
    "CREATE INDEX IF NOT EXISTS idx_municipio ON estabelecimentos(municipio)",
    "CREATE INDEX IF NOT EXISTS idx_cnae_principal ON estabelecimentos(cnae_principal)",
    "CREATE INDEX IF NOT EXISTS idx_cnae_descricao ON cnae(descricao)",
    "CREATE INDEX IF NOT EXISTS idx_motivos_descricao ON motivos(descricao)",
    "CREATE INDEX IF NOT EXISTS idx_municipios_nome ON municipios(nome)",
    "CREATE INDEX IF NOT EXISTS idx_municipios_uf ON municipios(uf)",
    "CREATE INDEX IF NOT EXISTS idx_naturezas_juridicas_descricao ON naturezas_juridicas(descricao)",
    "CREATE INDEX IF NOT EXISTS idx_paises_nome ON paises(nome)",
    "CREATE INDEX IF NOT EXISTS idx_qualificacoes_descricao ON qualificacoes(descricao)",
    "CREATE INDEX IF NOT EXISTS idx_simples_opcao_simples ON simples(opcao_simples)",
    "CREATE INDEX IF NOT EXISTS idx_simples_opcao_mei ON simples(opcao_mei)",
    "CREATE INDEX IF NOT EXISTS idx_socios_nome_socio ON socios(nome_socio)",
    "CREATE INDEX IF NOT EXISTS idx_socios_cnpj_cpf_socio ON socios(cnpj_cpf_socio)",
];

/// Create all target tables
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    info!("Creating store schema");

    for ddl in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .context("Failed to create table")?;
    }

    info!("Store schema created");
    Ok(())
}

/// Create search indices
pub async fn create_indices(pool: &SqlitePool) -> Result<()> {
    info!("Creating search indices");

    for ddl in INDICES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .context("Failed to create index")?;
    }

    info!("Search indices created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_store;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = open_memory_store().await.unwrap();

        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();
        create_indices(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for table in [
            "empresas",
            "estabelecimentos",
            "socios",
            "simples",
            "cnae",
            "motivos",
            "municipios",
            "naturezas_juridicas",
            "paises",
            "qualificacoes",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_generated_full_tax_id() {
        let pool = open_memory_store().await.unwrap();
        create_schema(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO estabelecimentos (cnpj_basico, cnpj_ordem, cnpj_dv) \
             VALUES ('12345678', '0001', '95')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let completo: String =
            sqlx::query_scalar("SELECT cnpj_completo FROM estabelecimentos")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(completo, "12345678000195");
    }
}
