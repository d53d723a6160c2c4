//! Fixed user-facing strings
//!
//! Defaults are Dutch. Any field can be overridden from the config file; the
//! rest keep their defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub title: String,
    pub input_placeholder: String,
    pub send_label: String,
    pub sending_label: String,
    pub user_label: String,
    pub assistant_label: String,
    pub thinking: String,
    pub start_error: String,
    pub send_error: String,
    pub memory_cleared: String,
    pub maintenance_title: String,
    pub maintenance_body: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            title: "UWV Chatbot".to_string(),
            input_placeholder: "Typ uw vraag hier...".to_string(),
            send_label: "Zend".to_string(),
            sending_label: "...".to_string(),
            user_label: "U".to_string(),
            assistant_label: "UWV".to_string(),
            thinking: "Bezig met nadenken".to_string(),
            start_error:
                "Sorry, er is een fout opgetreden bij het starten van een nieuwe conversatie."
                    .to_string(),
            send_error: "Sorry, er is een fout opgetreden bij het verzenden van het bericht."
                .to_string(),
            memory_cleared: "Het geheugen is gewist. Waarmee kan ik u helpen?".to_string(),
            maintenance_title: "Onderhoud".to_string(),
            maintenance_body:
                "Onze site is momenteel niet beschikbaar vanwege onderhoud. Probeer het later opnieuw."
                    .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_other_defaults() {
        let texts: Texts =
            serde_json::from_str(r#"{ "send_label": "Send", "send_error": "Oops" }"#).unwrap();
        assert_eq!(texts.send_label, "Send");
        assert_eq!(texts.send_error, "Oops");
        assert_eq!(texts.title, "UWV Chatbot");
        assert_eq!(texts.start_error, Texts::default().start_error);
    }
}
