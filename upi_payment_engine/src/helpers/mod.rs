mod identifiers;
mod notification_parser;
mod upi_payload;

pub use identifiers::{mask_secret, new_api_key, new_listener_token, new_order_id, API_KEY_PREFIX, LISTENER_TOKEN_PREFIX};
pub use notification_parser::{
    extract_order_id,
    extract_payer_name,
    parse_notification,
    ParsedNotification,
    BIG_TEXT_KEY,
    TEXT_KEY,
    TITLE_KEY,
    UNKNOWN_PAYER,
};
pub use upi_payload::{UpiPaymentRequest, UPI_SCHEME};
