//! # Domain Types
//!
//! Core domain types used throughout the back office, and the single
//! place where loosely shaped API records become those types.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Client       │   │   Enrollment    │   │  KanbanStage    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name           │   │  client_id (FK) │   │  name           │       │
//! │  │  document       │   │  course_name    │   │  pipeline       │       │
//! │  │  phone, cep     │   │  subtotal/fee/  │   │  position       │       │
//! │  │  stage_id       │   │  discount       │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Normalization
//! The REST API is not consistent about key names (`name` / `nome`,
//! `clientId` / `client_id` / `client.id`, ...). Each target field has a
//! [`FieldSource`]: an ordered list of source keys, tried first to last.
//! `from_api` runs once, right after the fetch; rendering code only ever
//! sees the normalized types.
//!
//! ```rust
//! use crm_core::types::Client;
//! use serde_json::json;
//!
//! let client = Client::from_api(&json!({
//!     "_id": "c-1",
//!     "nome": "Maria Souza",
//!     "telefone": "(11) 98765-4321",
//!     "cpfCnpj": "529.982.247-25",
//! })).unwrap();
//!
//! assert_eq!(client.name, "Maria Souza");
//! assert_eq!(client.phone.as_deref(), Some("11987654321"));
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::document::{self, DocumentKind};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::EnrollmentPricing;

// =============================================================================
// Field Sources
// =============================================================================

/// Ordered source keys for one target field. Dotted keys descend into
/// nested objects (`course.name`).
#[derive(Debug, Clone, Copy)]
pub struct FieldSource {
    /// Field name on the normalized type (used in errors).
    pub target: &'static str,
    /// Source keys, highest priority first.
    pub keys: &'static [&'static str],
}

/// Source key lists for every normalized field.
pub mod sources {
    use super::FieldSource;

    pub const CLIENT_ID: FieldSource = FieldSource {
        target: "id",
        keys: &["id", "_id", "clientId", "client_id"],
    };
    pub const CLIENT_NAME: FieldSource = FieldSource {
        target: "name",
        keys: &["name", "nome", "fullName", "razaoSocial"],
    };
    pub const CLIENT_EMAIL: FieldSource = FieldSource {
        target: "email",
        keys: &["email", "e_mail", "mail"],
    };
    pub const CLIENT_PHONE: FieldSource = FieldSource {
        target: "phone",
        keys: &["phone", "telefone", "celular", "whatsapp", "mobile"],
    };
    pub const CLIENT_DOCUMENT: FieldSource = FieldSource {
        target: "document",
        keys: &["document", "cpfCnpj", "cpf_cnpj", "cpf", "cnpj", "documento"],
    };
    pub const CLIENT_CEP: FieldSource = FieldSource {
        target: "cep",
        keys: &["cep", "zipCode", "postalCode", "address.cep", "endereco.cep"],
    };

    pub const STAGE_REF: FieldSource = FieldSource {
        target: "stageId",
        keys: &["stageId", "stage_id", "stage.id", "kanbanStageId", "etapaId", "etapa"],
    };
    pub const CREATED_AT: FieldSource = FieldSource {
        target: "createdAt",
        keys: &["createdAt", "created_at", "dataCriacao"],
    };

    pub const ENROLLMENT_ID: FieldSource = FieldSource {
        target: "id",
        keys: &["id", "_id", "enrollmentId", "matriculaId"],
    };
    pub const ENROLLMENT_CLIENT: FieldSource = FieldSource {
        target: "clientId",
        keys: &["clientId", "client_id", "client.id", "clienteId", "cliente_id"],
    };
    pub const ENROLLMENT_COURSE: FieldSource = FieldSource {
        target: "courseName",
        keys: &["courseName", "course_name", "course.name", "curso.nome", "curso"],
    };
    pub const ENROLLMENT_SUBTOTAL: FieldSource = FieldSource {
        target: "subtotal",
        keys: &["subtotal", "valor", "value", "price"],
    };
    pub const ENROLLMENT_FEE: FieldSource = FieldSource {
        target: "enrollmentFee",
        keys: &["enrollmentFee", "enrollment_fee", "taxaMatricula", "fee"],
    };
    pub const ENROLLMENT_DISCOUNT: FieldSource = FieldSource {
        target: "discount",
        keys: &["discount", "desconto"],
    };

    pub const STAGE_ID: FieldSource = FieldSource {
        target: "id",
        keys: &["id", "_id", "stageId"],
    };
    pub const STAGE_NAME: FieldSource = FieldSource {
        target: "name",
        keys: &["name", "title", "nome", "titulo"],
    };
    pub const STAGE_POSITION: FieldSource = FieldSource {
        target: "position",
        keys: &["position", "order", "ordem", "index"],
    };
    pub const STAGE_PIPELINE: FieldSource = FieldSource {
        target: "pipeline",
        keys: &["pipeline", "pipelineType", "type", "kind"],
    };
    pub const STAGE_COLOR: FieldSource = FieldSource {
        target: "color",
        keys: &["color", "cor"],
    };
}

/// Read access to one API record of a given entity.
struct ApiRecord<'v> {
    entity: &'static str,
    value: &'v Value,
}

impl<'v> ApiRecord<'v> {
    /// Unwraps a `{"data": {...}}` envelope when present.
    fn new(entity: &'static str, value: &'v Value) -> Self {
        let value = match value.get("data") {
            Some(inner @ Value::Object(_)) => inner,
            _ => value,
        };
        ApiRecord { entity, value }
    }

    fn lookup(&self, path: &str) -> Option<&'v Value> {
        path.split('.')
            .try_fold(self.value, |node, key| node.get(key))
            .filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    /// First present value in priority order.
    fn first(&self, source: &FieldSource) -> Option<&'v Value> {
        source.keys.iter().find_map(|key| self.lookup(key))
    }

    fn text(&self, source: &FieldSource) -> Option<String> {
        match self.first(source)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn required_text(&self, source: &FieldSource) -> CoreResult<String> {
        self.text(source).ok_or_else(|| self.missing(source))
    }

    /// Digits-only form of a text field; `None` if no digit is left.
    fn digits(&self, source: &FieldSource) -> Option<String> {
        self.text(source)
            .map(|s| document::only_digits(&s))
            .filter(|d| !d.is_empty())
    }

    /// Money from a JSON number of reais or a canonical/masked string.
    /// Unreadable values become zero.
    fn money(&self, source: &FieldSource) -> Money {
        let parsed = match self.first(source) {
            None => return Money::zero(),
            Some(Value::Number(n)) => n.as_f64().map(Money::from_reais),
            Some(Value::String(s)) => Money::from_api_str(s),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| {
            tracing::debug!(
                entity = self.entity,
                field = source.target,
                "unreadable monetary value, using zero"
            );
            Money::zero()
        })
    }

    /// RFC 3339 string or epoch milliseconds.
    fn timestamp(&self, source: &FieldSource) -> Option<DateTime<Utc>> {
        match self.first(source)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
            _ => None,
        }
    }

    fn missing(&self, source: &FieldSource) -> CoreError {
        CoreError::MalformedRecord {
            entity: self.entity.to_string(),
            field: source.target.to_string(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// A client (lead or customer) of the school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Digits only.
    pub phone: Option<String>,
    /// CPF or CNPJ, digits only.
    pub document: Option<String>,
    /// Derived from the document's digit count.
    pub document_kind: Option<DocumentKind>,
    /// Digits only.
    pub cep: Option<String>,
    /// Current kanban stage in the sales pipeline.
    pub stage_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Client {
    /// Normalizes a client record from the API.
    ///
    /// Fails only when `id` or `name` is absent under every source key.
    pub fn from_api(value: &Value) -> CoreResult<Client> {
        let record = ApiRecord::new("client", value);
        let document = record.digits(&sources::CLIENT_DOCUMENT);

        Ok(Client {
            id: record.required_text(&sources::CLIENT_ID)?,
            name: record.required_text(&sources::CLIENT_NAME)?,
            email: record.text(&sources::CLIENT_EMAIL).map(|e| e.to_lowercase()),
            phone: record.digits(&sources::CLIENT_PHONE),
            document_kind: document.as_deref().and_then(document::detect_document),
            document,
            cep: record.digits(&sources::CLIENT_CEP),
            stage_id: record.text(&sources::STAGE_REF),
            created_at: record.timestamp(&sources::CREATED_AT),
        })
    }

    /// Document masked for display (`529.982.247-25`).
    pub fn document_display(&self) -> Option<String> {
        self.document.as_deref().and_then(document::format_document)
    }

    /// Phone masked for display, or the raw digits for foreign numbers.
    pub fn phone_display(&self) -> Option<String> {
        let phone = self.phone.as_deref()?;
        Some(document::format_phone(phone).unwrap_or_else(|| phone.to_string()))
    }
}

// =============================================================================
// Enrollment
// =============================================================================

/// An enrollment proposal: a client, a course and its pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    pub client_id: String,
    pub course_name: String,
    pub subtotal: Money,
    pub enrollment_fee: Money,
    pub discount: Money,
    /// Current kanban stage in the enrollment pipeline.
    pub stage_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// Normalizes an enrollment record from the API.
    ///
    /// Monetary fields are optional and read as zero when absent.
    pub fn from_api(value: &Value) -> CoreResult<Enrollment> {
        let record = ApiRecord::new("enrollment", value);

        Ok(Enrollment {
            id: record.required_text(&sources::ENROLLMENT_ID)?,
            client_id: record.required_text(&sources::ENROLLMENT_CLIENT)?,
            course_name: record.required_text(&sources::ENROLLMENT_COURSE)?,
            subtotal: record.money(&sources::ENROLLMENT_SUBTOTAL),
            enrollment_fee: record.money(&sources::ENROLLMENT_FEE),
            discount: record.money(&sources::ENROLLMENT_DISCOUNT),
            stage_id: record.text(&sources::STAGE_REF),
            created_at: record.timestamp(&sources::CREATED_AT),
        })
    }

    pub fn pricing(&self) -> EnrollmentPricing {
        EnrollmentPricing::new(self.subtotal, self.enrollment_fee, self.discount)
    }

    /// `subtotal + enrollment_fee - discount`.
    pub fn total(&self) -> Money {
        self.pricing().total()
    }
}

// =============================================================================
// Kanban Stage
// =============================================================================

/// Which board a stage belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Lead → proposal → enrollment.
    #[default]
    Sales,
    /// Post-sale support tickets.
    Support,
}

impl PipelineKind {
    /// Reads the API's pipeline labels (English or Portuguese).
    pub fn from_label(label: &str) -> Option<PipelineKind> {
        match label.trim().to_lowercase().as_str() {
            "sales" | "vendas" | "comercial" => Some(PipelineKind::Sales),
            "support" | "suporte" | "atendimento" => Some(PipelineKind::Support),
            _ => None,
        }
    }
}

/// A column of a kanban board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct KanbanStage {
    pub id: String,
    pub name: String,
    pub pipeline: PipelineKind,
    /// Column order, ascending left to right.
    pub position: u32,
    pub color: Option<String>,
}

impl KanbanStage {
    /// Normalizes a stage record from the API.
    ///
    /// A missing or unknown pipeline label means [`PipelineKind::Sales`];
    /// a missing position means 0.
    pub fn from_api(value: &Value) -> CoreResult<KanbanStage> {
        let record = ApiRecord::new("stage", value);

        let pipeline = match record.text(&sources::STAGE_PIPELINE) {
            Some(label) => PipelineKind::from_label(&label).unwrap_or_else(|| {
                tracing::debug!(label = %label, "unknown pipeline label, using sales");
                PipelineKind::Sales
            }),
            None => PipelineKind::Sales,
        };

        let position = record
            .text(&sources::STAGE_POSITION)
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(0);

        Ok(KanbanStage {
            id: record.required_text(&sources::STAGE_ID)?,
            name: record.required_text(&sources::STAGE_NAME)?,
            pipeline,
            position,
            color: record.text(&sources::STAGE_COLOR),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_canonical_keys() {
        let client = Client::from_api(&json!({
            "id": "c-1",
            "name": "Maria Souza",
            "email": "Maria@Exemplo.com",
            "phone": "(11) 98765-4321",
            "document": "529.982.247-25",
            "cep": "01310-100",
            "stageId": "lead",
            "createdAt": "2024-03-01T12:00:00Z",
        }))
        .unwrap();

        assert_eq!(client.id, "c-1");
        assert_eq!(client.email.as_deref(), Some("maria@exemplo.com"));
        assert_eq!(client.document.as_deref(), Some("52998224725"));
        assert_eq!(client.document_kind, Some(DocumentKind::Cpf));
        assert_eq!(client.cep.as_deref(), Some("01310100"));
        assert_eq!(client.stage_id.as_deref(), Some("lead"));
        assert_eq!(
            client.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(client.document_display().as_deref(), Some("529.982.247-25"));
        assert_eq!(client.phone_display().as_deref(), Some("(11) 98765-4321"));
    }

    #[test]
    fn test_client_fallback_keys_and_priority() {
        let client = Client::from_api(&json!({
            "_id": 42,
            "nome": "Escola Alfa",
            "name": "",
            "cnpj": "11.222.333/0001-81",
            "celular": "+55 11 98765-4321",
            "endereco": { "cep": "01310-100" },
            "stage": { "id": "proposta" },
            "created_at": 1709294400000i64,
        }))
        .unwrap();

        // Blank "name" falls through to "nome"
        assert_eq!(client.id, "42");
        assert_eq!(client.name, "Escola Alfa");
        assert_eq!(client.document_kind, Some(DocumentKind::Cnpj));
        assert_eq!(client.phone.as_deref(), Some("5511987654321"));
        assert_eq!(client.phone_display().as_deref(), Some("5511987654321"));
        assert_eq!(client.cep.as_deref(), Some("01310100"));
        assert_eq!(client.stage_id.as_deref(), Some("proposta"));
        assert_eq!(
            client.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_client_earlier_key_wins() {
        let client = Client::from_api(&json!({
            "id": "c-1",
            "name": "Primary",
            "nome": "Secondary",
            "telefone": "1134567890",
            "whatsapp": "11987654321",
        }))
        .unwrap();
        assert_eq!(client.name, "Primary");
        assert_eq!(client.phone.as_deref(), Some("1134567890"));
    }

    #[test]
    fn test_client_envelope_and_missing_fields() {
        let client = Client::from_api(&json!({ "data": { "id": "c-9", "name": "Ana" } })).unwrap();
        assert_eq!(client.id, "c-9");
        assert_eq!(client.document, None);
        assert_eq!(client.document_kind, None);

        let err = Client::from_api(&json!({ "id": "c-1" })).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedRecord { ref field, .. } if field == "name"
        ));

        assert!(Client::from_api(&json!("not an object")).is_err());
    }

    #[test]
    fn test_enrollment_money_shapes() {
        let enrollment = Enrollment::from_api(&json!({
            "id": "e-1",
            "client": { "id": "c-1" },
            "course": { "name": "Inglês Intensivo" },
            "valor": "1.000,00",
            "taxaMatricula": 50,
            "desconto": "100.00",
            "etapa": "negociacao",
        }))
        .unwrap();

        assert_eq!(enrollment.client_id, "c-1");
        assert_eq!(enrollment.course_name, "Inglês Intensivo");
        assert_eq!(enrollment.subtotal.cents(), 100000);
        assert_eq!(enrollment.enrollment_fee.cents(), 5000);
        assert_eq!(enrollment.discount.cents(), 10000);
        assert_eq!(enrollment.total().to_string(), "R$ 950,00");
        assert_eq!(enrollment.stage_id.as_deref(), Some("negociacao"));
    }

    #[test]
    fn test_enrollment_unreadable_money_is_zero() {
        let enrollment = Enrollment::from_api(&json!({
            "id": "e-2",
            "clientId": "c-1",
            "curso": "Espanhol",
            "subtotal": "a combinar",
            "discount": true,
        }))
        .unwrap();

        assert_eq!(enrollment.subtotal, Money::zero());
        assert_eq!(enrollment.enrollment_fee, Money::zero());
        assert_eq!(enrollment.discount, Money::zero());
        assert_eq!(enrollment.created_at, None);
    }

    #[test]
    fn test_enrollment_requires_client() {
        let err = Enrollment::from_api(&json!({ "id": "e-1", "curso": "Inglês" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "enrollment record is missing required field 'clientId'"
        );
    }

    #[test]
    fn test_stage_from_api() {
        let stage = KanbanStage::from_api(&json!({
            "_id": "s-2",
            "titulo": "Suporte N1",
            "ordem": "3",
            "type": "Suporte",
            "cor": "#ff0000",
        }))
        .unwrap();

        assert_eq!(stage.id, "s-2");
        assert_eq!(stage.name, "Suporte N1");
        assert_eq!(stage.position, 3);
        assert_eq!(stage.pipeline, PipelineKind::Support);
        assert_eq!(stage.color.as_deref(), Some("#ff0000"));

        let defaulted = KanbanStage::from_api(&json!({
            "id": "s-1",
            "name": "Lead",
            "pipeline": "marketing",
        }))
        .unwrap();
        assert_eq!(defaulted.pipeline, PipelineKind::Sales);
        assert_eq!(defaulted.position, 0);
    }

    #[test]
    fn test_client_serializes_camel_case() {
        let client = Client::from_api(&json!({ "id": "c-1", "name": "Ana", "cpf": "52998224725" }))
            .unwrap();
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["documentKind"], "cpf");
        assert!(json["stageId"].is_null());
    }
}
