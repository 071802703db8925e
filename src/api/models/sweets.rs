use serde::Deserialize;

/// Body of create and update requests
///
/// Every field is optional at the wire level so that missing values surface
/// as validation errors rather than JSON rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestockQuery {
    pub amount: i32,
}
