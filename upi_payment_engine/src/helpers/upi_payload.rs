use url::form_urlencoded;

use crate::db_types::{OrderId, Paise};

pub const UPI_SCHEME: &str = "upi://pay";

/// The fields of a UPI payment intent, as encoded in the QR code shown to the customer.
#[derive(Debug, Clone)]
pub struct UpiPaymentRequest<'a> {
    /// Payee address (VPA), e.g. `merchant@upi`
    pub payee_address: &'a str,
    /// Payee display name
    pub payee_name: &'a str,
    pub amount: Paise,
    /// Used as both the transaction reference and the transaction note, so that the order id is echoed back in the
    /// payment notification.
    pub order_id: &'a OrderId,
}

impl<'a> UpiPaymentRequest<'a> {
    pub fn new(payee_address: &'a str, payee_name: &'a str, amount: Paise, order_id: &'a OrderId) -> Self {
        Self { payee_address, payee_name, amount, order_id }
    }

    /// Renders the `upi://pay?...` URI. Parameters are form-url-encoded.
    pub fn to_uri(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("pa", self.payee_address)
            .append_pair("pn", self.payee_name)
            .append_pair("am", &self.amount.to_rupee_string())
            .append_pair("tr", self.order_id.as_str())
            .append_pair("tn", self.order_id.as_str())
            .finish();
        format!("{UPI_SCHEME}?{query}")
    }
}
