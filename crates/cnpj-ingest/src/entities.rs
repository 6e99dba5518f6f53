//! Entity schema descriptors
//!
//! One declarative descriptor per registry entity drives the whole
//! pipeline: field order and normalization kind, natural key, minimum
//! field count, batch size, and the per-row error policy. The generic
//! pipeline replaces the per-entity loader functions the source layout
//! would otherwise require.

use cnpj_common::CnpjError;

use crate::models::{FieldValue, Record};

/// Registry entities, in processing order: the six reference tables
/// first, then companies, establishments, the simplified-tax regime
/// and partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Cnae,
    Motivos,
    Municipios,
    Naturezas,
    Paises,
    Qualificacoes,
    Empresas,
    Estabelecimentos,
    Simples,
    Socios,
}

impl Entity {
    /// All entities, in processing order
    pub const ALL: [Entity; 10] = [
        Entity::Cnae,
        Entity::Motivos,
        Entity::Municipios,
        Entity::Naturezas,
        Entity::Paises,
        Entity::Qualificacoes,
        Entity::Empresas,
        Entity::Estabelecimentos,
        Entity::Simples,
        Entity::Socios,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Cnae => "cnae",
            Entity::Motivos => "motivos",
            Entity::Municipios => "municipios",
            Entity::Naturezas => "naturezas",
            Entity::Paises => "paises",
            Entity::Qualificacoes => "qualificacoes",
            Entity::Empresas => "empresas",
            Entity::Estabelecimentos => "estabelecimentos",
            Entity::Simples => "simples",
            Entity::Socios => "socios",
        }
    }

    /// File-name tokens the registry uses for this entity's extracts
    /// (e.g. `K3241.K03200Y0.D50412.EMPRECSV`)
    fn file_tokens(&self) -> &'static [&'static str] {
        match self {
            Entity::Cnae => &["CNAECSV", "CNAES"],
            Entity::Motivos => &["MOTICSV", "MOTIVOS"],
            Entity::Municipios => &["MUNICCSV", "MUNICIPIOS"],
            Entity::Naturezas => &["NATJUCSV", "NATUREZAS"],
            Entity::Paises => &["PAISCSV", "PAISES"],
            Entity::Qualificacoes => &["QUALSCSV", "QUALIFICACOES"],
            Entity::Empresas => &["EMPRECSV", "EMPRESAS"],
            Entity::Estabelecimentos => &["ESTABELE"],
            Entity::Simples => &["SIMPLES"],
            Entity::Socios => &["SOCIOCSV", "SOCIOS"],
        }
    }

    /// Whether an extracted file name belongs to this entity
    pub fn matches_file_name(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        self.file_tokens().iter().any(|token| upper.contains(token))
    }

    /// Get the schema descriptor for this entity
    pub fn descriptor(&self) -> EntityDescriptor {
        match self {
            Entity::Cnae => cnae(),
            Entity::Motivos => motivos(),
            Entity::Municipios => municipios(),
            Entity::Naturezas => naturezas(),
            Entity::Paises => paises(),
            Entity::Qualificacoes => qualificacoes(),
            Entity::Empresas => empresas(),
            Entity::Estabelecimentos => estabelecimentos(),
            Entity::Simples => simples(),
            Entity::Socios => socios(),
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Entity {
    type Err = CnpjError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .iter()
            .find(|e| e.as_str() == s.to_lowercase())
            .copied()
            .ok_or_else(|| CnpjError::UnknownEntity(s.to_string()))
    }
}

/// Normalization applied to a column at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Stored as-is after quote/whitespace cleanup
    Text,
    /// Comma-decimal numeric, normalized to dot-decimal f64
    Decimal,
    /// Single-character S/N flag, normalized to 1/0
    Flag,
    /// Date kept as text; the empty string becomes NULL
    Date,
    /// CNAE activity code, reformatted to `0000-0/00`
    ActivityCode,
}

/// One target-table column
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub kind: FieldKind,
}

fn col(name: &'static str, kind: FieldKind) -> Column {
    Column { name, kind }
}

/// Declarative schema descriptor for one entity's ingestion
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub entity: Entity,
    /// Target table name
    pub table: &'static str,
    /// Columns in source-field order
    pub columns: Vec<Column>,
    /// Natural key column(s); the upsert conflict target
    pub key_columns: &'static [&'static str],
    /// Rows with fewer source fields are skipped silently
    pub min_fields: usize,
    /// Rows per batch; wider rows use smaller batches
    pub batch_size: usize,
    /// Per-row constraint violations are logged and skipped instead of
    /// aborting the batch (the reference-table loaders' behavior)
    pub skip_row_errors: bool,
}

impl EntityDescriptor {
    /// Build the entity's upsert statement: insert all columns, and on a
    /// natural-key conflict overwrite every non-key column with the
    /// incoming value.
    pub fn upsert_sql(&self) -> String {
        let cols: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        let placeholders = vec!["?"; cols.len()].join(", ");
        let updates: Vec<String> = cols
            .iter()
            .filter(|c| !self.key_columns.contains(c))
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
            self.table,
            cols.join(", "),
            placeholders,
            self.key_columns.join(", "),
            updates.join(", ")
        )
    }

    /// Render a row's natural key for log messages
    pub fn key_display(&self, row: &Record) -> String {
        let mut parts = Vec::with_capacity(self.key_columns.len());
        for key in self.key_columns {
            if let Some(idx) = self.columns.iter().position(|c| c.name == *key) {
                let value = row.get(idx).unwrap_or(&FieldValue::Null);
                parts.push(value.to_string());
            }
        }
        parts.join("/")
    }
}

fn empresas() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Empresas,
        table: "empresas",
        columns: vec![
            col("cnpj_basico", FieldKind::Text),
            col("razao_social", FieldKind::Text),
            col("natureza_juridica", FieldKind::Text),
            col("qualificacao_responsavel", FieldKind::Text),
            col("capital_social", FieldKind::Decimal),
            col("porte_empresa", FieldKind::Text),
            col("ente_federativo", FieldKind::Text),
        ],
        key_columns: &["cnpj_basico"],
        min_fields: 7,
        batch_size: 20_000,
        skip_row_errors: false,
    }
}

fn estabelecimentos() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Estabelecimentos,
        table: "estabelecimentos",
        columns: vec![
            col("cnpj_basico", FieldKind::Text),
            col("cnpj_ordem", FieldKind::Text),
            col("cnpj_dv", FieldKind::Text),
            col("nome_fantasia", FieldKind::Text),
            col("situacao_cadastral", FieldKind::Text),
            col("data_situacao_cadastral", FieldKind::Date),
            col("motivo_situacao_cadastral", FieldKind::Text),
            col("cidade_exterior", FieldKind::Text),
            col("pais", FieldKind::Text),
            col("data_inicio_atividade", FieldKind::Date),
            col("cnae_principal", FieldKind::Text),
            col("cnaes_secundarios", FieldKind::Text),
            col("tipo_logradouro", FieldKind::Text),
            col("logradouro", FieldKind::Text),
            col("numero", FieldKind::Text),
            col("complemento", FieldKind::Text),
            col("bairro", FieldKind::Text),
            col("cep", FieldKind::Text),
            col("uf", FieldKind::Text),
            col("municipio", FieldKind::Text),
            col("ddd1", FieldKind::Text),
            col("telefone1", FieldKind::Text),
            col("ddd2", FieldKind::Text),
            col("telefone2", FieldKind::Text),
            col("email", FieldKind::Text),
        ],
        key_columns: &["cnpj_basico", "cnpj_ordem", "cnpj_dv"],
        min_fields: 25,
        // Widest rows of the dataset, so the smallest batch
        batch_size: 10_000,
        skip_row_errors: false,
    }
}

fn socios() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Socios,
        table: "socios",
        columns: vec![
            col("cnpj_basico", FieldKind::Text),
            col("identificador_socio", FieldKind::Text),
            col("nome_socio", FieldKind::Text),
            col("cnpj_cpf_socio", FieldKind::Text),
            col("qualificacao_socio", FieldKind::Text),
            col("data_entrada_sociedade", FieldKind::Date),
            col("pais", FieldKind::Text),
            col("representante_legal", FieldKind::Text),
            col("nome_representante", FieldKind::Text),
            col("qualificacao_representante", FieldKind::Text),
            col("faixa_etaria", FieldKind::Text),
        ],
        key_columns: &["cnpj_basico", "cnpj_cpf_socio", "qualificacao_socio"],
        min_fields: 11,
        batch_size: 20_000,
        skip_row_errors: false,
    }
}

fn simples() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Simples,
        table: "simples",
        columns: vec![
            col("cnpj_basico", FieldKind::Text),
            col("opcao_simples", FieldKind::Flag),
            col("data_opcao_simples", FieldKind::Date),
            col("data_exclusao_simples", FieldKind::Date),
            col("opcao_mei", FieldKind::Flag),
            col("data_opcao_mei", FieldKind::Date),
            col("data_exclusao_mei", FieldKind::Date),
        ],
        key_columns: &["cnpj_basico"],
        min_fields: 7,
        batch_size: 20_000,
        skip_row_errors: false,
    }
}

fn cnae() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Cnae,
        table: "cnae",
        columns: vec![
            col("codigo", FieldKind::ActivityCode),
            col("descricao", FieldKind::Text),
        ],
        key_columns: &["codigo"],
        min_fields: 2,
        batch_size: 10_000,
        skip_row_errors: true,
    }
}

fn motivos() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Motivos,
        table: "motivos",
        columns: vec![
            col("codigo", FieldKind::Text),
            col("descricao", FieldKind::Text),
        ],
        key_columns: &["codigo"],
        min_fields: 2,
        batch_size: 1_000,
        skip_row_errors: true,
    }
}

fn municipios() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Municipios,
        table: "municipios",
        columns: vec![
            col("codigo", FieldKind::Text),
            col("nome", FieldKind::Text),
            col("uf", FieldKind::Text),
        ],
        key_columns: &["codigo"],
        min_fields: 3,
        batch_size: 1_000,
        skip_row_errors: true,
    }
}

fn naturezas() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Naturezas,
        table: "naturezas_juridicas",
        columns: vec![
            col("codigo", FieldKind::Text),
            col("descricao", FieldKind::Text),
        ],
        key_columns: &["codigo"],
        min_fields: 2,
        batch_size: 1_000,
        skip_row_errors: true,
    }
}

fn paises() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Paises,
        table: "paises",
        columns: vec![
            col("codigo", FieldKind::Text),
            col("nome", FieldKind::Text),
        ],
        key_columns: &["codigo"],
        min_fields: 2,
        batch_size: 1_000,
        skip_row_errors: true,
    }
}

fn qualificacoes() -> EntityDescriptor {
    EntityDescriptor {
        entity: Entity::Qualificacoes,
        table: "qualificacoes",
        columns: vec![
            col("codigo", FieldKind::Text),
            col("descricao", FieldKind::Text),
        ],
        key_columns: &["codigo"],
        min_fields: 2,
        batch_size: 1_000,
        skip_row_errors: true,
    }
}
