use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct BootstrapRequest { pub tenant_name: String, pub email: String, pub name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub tenant_id: Uuid, pub email: String, pub password: String }

/// `role` is `admin` or `client` (default).
#[derive(ToSchema)]
pub struct NewUserRequest { pub email: String, pub name: String, pub password: String, pub role: Option<String> }

#[derive(ToSchema)]
pub struct FeeScheduleDoc {
    pub management_fee_bps: u32,
    pub performance_fee_bps: u32,
    pub entry_fee_bps: u32,
    pub hurdle_rate_bps: u32,
}

/// `category`: private_equity, venture_capital, real_estate, private_credit, hedge_fund, infrastructure, other.
#[derive(ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub currency: String,
    pub min_investment_cents: i64,
    pub target_size_cents: Option<i64>,
    pub fee_schedule: Option<FeeScheduleDoc>,
    pub media_urls: Option<Vec<String>>,
}

/// Admins set `client_id`; clients commit for themselves.
#[derive(ToSchema)]
pub struct CommitmentRequest { pub product_id: Uuid, pub amount_cents: i64, pub client_id: Option<Uuid>, pub note: Option<String> }

#[derive(ToSchema)]
pub struct SubscriptionRequest { pub commitment_id: Uuid, pub terms: Option<String> }

/// PNG or JPEG data URL, at most 1 MiB.
#[derive(ToSchema)]
pub struct SignRequest { pub signature_data_url: String }

#[derive(ToSchema)]
pub struct BankDetailsDoc {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub iban: Option<String>,
    pub swift: Option<String>,
    pub reference: String,
}

/// `due_date` as `YYYY-MM-DD`.
#[derive(ToSchema)]
pub struct CapitalCallRequest { pub subscription_id: Uuid, pub amount_cents: i64, pub due_date: String, pub bank_details: BankDetailsDoc }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::system::health,
        crate::routes::auth::bootstrap,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::auth::register,
        crate::routes::products::create,
        crate::routes::products::list,
        crate::routes::commitments::create,
        crate::routes::commitments::summary,
        crate::routes::lifecycle::create_subscription,
        crate::routes::lifecycle::sign_subscription,
        crate::routes::lifecycle::issue_capital_call,
        crate::routes::documents::list_statements,
        crate::routes::portfolio::view,
        crate::routes::files::upload,
    ),
    components(
        schemas(
            HealthResponse,
            BootstrapRequest,
            LoginRequest,
            NewUserRequest,
            FeeScheduleDoc,
            ProductRequest,
            CommitmentRequest,
            SubscriptionRequest,
            SignRequest,
            BankDetailsDoc,
            CapitalCallRequest,
        )
    ),
    tags(
        (name = "system"),
        (name = "auth"),
        (name = "products"),
        (name = "commitments"),
        (name = "subscriptions"),
        (name = "capital_calls"),
        (name = "documents"),
        (name = "portfolio"),
        (name = "files")
    )
)]
pub struct ApiDoc;
