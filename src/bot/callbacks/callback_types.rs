//! Callback actions carried by inline keyboard buttons

use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::language::Language;

/// Every action an inline button of this bot can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// `language_en` / `language_ru`
    SetLanguage(Language),
    Support,
    About,
    SendSupportRequest,
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::SetLanguage(language) => write!(f, "language_{}", language.code()),
            CallbackAction::Support => f.write_str("support"),
            CallbackAction::About => f.write_str("about"),
            CallbackAction::SendSupportRequest => f.write_str("send_support_request"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = AppError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "language_en" => Ok(CallbackAction::SetLanguage(Language::En)),
            "language_ru" => Ok(CallbackAction::SetLanguage(Language::Ru)),
            "support" => Ok(CallbackAction::Support),
            "about" => Ok(CallbackAction::About),
            "send_support_request" => Ok(CallbackAction::SendSupportRequest),
            other => Err(AppError::Validation(format!(
                "Unknown callback data: '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!(
            "language_en".parse::<CallbackAction>().unwrap(),
            CallbackAction::SetLanguage(Language::En)
        );
        assert_eq!(
            "language_ru".parse::<CallbackAction>().unwrap(),
            CallbackAction::SetLanguage(Language::Ru)
        );
        assert_eq!("support".parse::<CallbackAction>().unwrap(), CallbackAction::Support);
        assert_eq!("about".parse::<CallbackAction>().unwrap(), CallbackAction::About);
        assert_eq!(
            "send_support_request".parse::<CallbackAction>().unwrap(),
            CallbackAction::SendSupportRequest
        );
    }

    #[test]
    fn test_unknown_data_is_rejected() {
        assert!("language_de".parse::<CallbackAction>().is_err());
        assert!("".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for action in [
            CallbackAction::SetLanguage(Language::En),
            CallbackAction::SetLanguage(Language::Ru),
            CallbackAction::Support,
            CallbackAction::About,
            CallbackAction::SendSupportRequest,
        ] {
            assert_eq!(action.to_string().parse::<CallbackAction>().unwrap(), action);
        }
    }
}
