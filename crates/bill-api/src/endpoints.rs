//! Typed endpoint groups
//!
//! Thin wrappers pairing each backend route with its method, auth and cache
//! settings, so page components never hand-assemble `ApiRequest`s. Grouped by
//! backend controller.
//!
//! Not represented here: multipart file upload and chunked streaming chat —
//! both ride host-specific transports outside this pipeline.

use serde_json::{Value, json};

use crate::error::Result;
use crate::pipeline::{ApiClient, ApiRequest};
use crate::response::ApiResponse;
use crate::transport::RawResponse;

/// Reporting period for AI spending insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightPeriod {
    Monthly,
    Quarterly,
    Yearly,
}

impl InsightPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightPeriod::Monthly => "monthly",
            InsightPeriod::Quarterly => "quarterly",
            InsightPeriod::Yearly => "yearly",
        }
    }
}

impl ApiClient {
    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    pub fn bills(&self) -> Bills<'_> {
        Bills { client: self }
    }

    pub fn budgets(&self) -> Budgets<'_> {
        Budgets { client: self }
    }

    pub fn categories(&self) -> Categories<'_> {
        Categories { client: self }
    }

    pub fn exchange(&self) -> Exchange<'_> {
        Exchange { client: self }
    }

    pub fn ai_config(&self) -> AiConfig<'_> {
        AiConfig { client: self }
    }

    pub fn insights(&self) -> Insights<'_> {
        Insights { client: self }
    }
}

/// User account endpoints (`/user`).
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl Users<'_> {
    /// Exchange a platform login code for a session payload (contains the
    /// bearer token). Unauthenticated by definition.
    pub async fn login(&self, code: &str) -> Result<ApiResponse> {
        self.client
            .request(
                ApiRequest::post("/user/wxlogin")
                    .data(json!({"code": code}))
                    .no_auth(),
            )
            .await
    }

    /// The currently logged-in user.
    pub async fn current(&self) -> Result<ApiResponse> {
        self.client.request(ApiRequest::get("/user/me")).await
    }

    pub async fn by_id(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get(format!("/user/{id}")))
            .await
    }

    pub async fn update(&self, id: &str, user: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::put(format!("/user/{id}")).data(user))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::delete(format!("/user/{id}")))
            .await
    }
}

/// Bill endpoints (`/bill`).
pub struct Bills<'a> {
    client: &'a ApiClient,
}

impl Bills<'_> {
    /// List bills with paging/filter parameters. Never cached — the list
    /// must reflect writes immediately.
    pub async fn list(&self, params: Option<Value>) -> Result<ApiResponse> {
        let mut req = ApiRequest::get("/bill").no_cache();
        if let Some(params) = params {
            req = req.data(params);
        }
        self.client.request(req).await
    }

    pub async fn by_id(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get(format!("/bill/{id}")))
            .await
    }

    pub async fn create(&self, bill: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::post("/bill").data(bill))
            .await
    }

    pub async fn update(&self, id: &str, bill: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::put(format!("/bill/{id}")).data(bill))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::delete(format!("/bill/{id}")))
            .await
    }
}

/// Budget endpoints (`/user-budget`).
pub struct Budgets<'a> {
    client: &'a ApiClient,
}

impl Budgets<'_> {
    pub async fn list(&self, params: Option<Value>) -> Result<ApiResponse> {
        let mut req = ApiRequest::get("/user-budget");
        if let Some(params) = params {
            req = req.data(params);
        }
        self.client.request(req).await
    }

    pub async fn by_id(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get(format!("/user-budget/{id}")))
            .await
    }

    pub async fn create(&self, budget: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::post("/user-budget").data(budget))
            .await
    }

    pub async fn update(&self, id: &str, budget: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::put(format!("/user-budget/{id}")).data(budget))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::delete(format!("/user-budget/{id}")))
            .await
    }

    /// Budgets currently in effect.
    pub async fn active(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/user-budget/active"))
            .await
    }

    pub async fn statistics(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/user-budget/statistics"))
            .await
    }

    /// Budgets whose spend crossed the alert threshold.
    pub async fn alerts(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/user-budget/alerts"))
            .await
    }

    pub async fn expiring(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/user-budget/expiring"))
            .await
    }
}

/// Bill category endpoints (`/bill-category`).
pub struct Categories<'a> {
    client: &'a ApiClient,
}

impl Categories<'_> {
    pub async fn list(&self, params: Option<Value>) -> Result<ApiResponse> {
        let mut req = ApiRequest::get("/bill-category");
        if let Some(params) = params {
            req = req.data(params);
        }
        self.client.request(req).await
    }

    pub async fn by_id(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get(format!("/bill-category/{id}")))
            .await
    }

    /// Category names available to the current user.
    pub async fn names(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/bill-category/names"))
            .await
    }

    /// System preset categories; public reference data.
    pub async fn system(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/bill-category/system").no_auth())
            .await
    }

    pub async fn create(&self, category: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::post("/bill-category").data(category))
            .await
    }

    pub async fn update(&self, id: &str, category: Value) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::put(format!("/bill-category/{id}")).data(category))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::delete(format!("/bill-category/{id}")))
            .await
    }

    pub async fn set_status(&self, id: &str, status: u8) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::put(format!("/bill-category/{id}/status/{status}")))
            .await
    }
}

/// Exchange rate endpoints (`/api/exchange`); public reference data.
pub struct Exchange<'a> {
    client: &'a ApiClient,
}

impl Exchange<'_> {
    pub async fn currencies(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/api/exchange/currencies").no_auth())
            .await
    }

    /// Convert an amount using stored rates. The backend reads the
    /// parameters from the query string of this POST.
    pub async fn convert(&self, amount: &str, from: &str, to: &str) -> Result<ApiResponse> {
        let query = query_string(&json!({"amount": amount, "from": from, "to": to}));
        self.client
            .request(ApiRequest::post(format!("/api/exchange/conversions?{query}")).no_auth())
            .await
    }
}

/// AI model configuration endpoints (`/ai-config`).
pub struct AiConfig<'a> {
    client: &'a ApiClient,
}

impl AiConfig<'_> {
    /// Available AI models; public reference data.
    pub async fn models(&self) -> Result<ApiResponse> {
        self.client
            .request(ApiRequest::get("/ai-config/models").no_auth())
            .await
    }

    pub async fn user_config(&self) -> Result<ApiResponse> {
        self.client.request(ApiRequest::get("/ai-config/user")).await
    }

    /// Update the user's model/temperature settings. Parameters travel in
    /// the query string of this PUT.
    pub async fn update_user_config(&self, config: &Value) -> Result<ApiResponse> {
        let query = query_string(config);
        self.client
            .request(ApiRequest::put(format!("/ai-config/user?{query}")))
            .await
    }
}

/// AI insight endpoints (`/ai-insight`).
pub struct Insights<'a> {
    client: &'a ApiClient,
}

impl Insights<'_> {
    /// Raw financial summary text for a period. The body is plain text, so
    /// the untouched transport response is returned.
    pub async fn summary(&self, period: InsightPeriod, date: Option<&str>) -> Result<RawResponse> {
        let mut req = ApiRequest::get(format!("/ai-insight/summary/{}", period.as_str()));
        if let Some(date) = date {
            req = req.data(json!({"date": date}));
        }
        self.client.request_raw(req).await
    }
}

/// Render a parameter object as a query string; null values are skipped.
fn query_string(params: &Value) -> String {
    let Value::Object(map) = params else {
        return String::new();
    };
    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{name}={rendered}")
        })
        .collect::<Vec<_>>()
        .join("&")
}
