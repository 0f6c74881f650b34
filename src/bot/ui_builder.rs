//! UI Builder module for creating keyboards and formatting messages

use reqwest::Url;
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    WebAppInfo,
};
use teloxide::utils::html;

use crate::language::Language;
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::registry::SessionEntry;

use super::callbacks::CallbackAction;

/// Sessions shown by /list; older ones are summarized so the listing fits one message
pub const MAX_SESSION_LINES: usize = 50;

/// Welcome text sent on /start and after a language switch
pub fn format_welcome_message(
    localization: &LocalizationManager,
    language: Language,
    first_name: &str,
) -> String {
    let name = html::escape(first_name);
    format!(
        "{}\n\n{}",
        t_args_lang(localization, "welcome-greeting", &[("name", name.as_str())], language),
        t_lang(localization, "welcome-instructions", language)
    )
}

/// Inline keyboard under the welcome message
pub fn create_welcome_keyboard(
    localization: &LocalizationManager,
    language: Language,
    website: &Url,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::url(
                t_lang(localization, "button-website", language),
                website.clone(),
            ),
            InlineKeyboardButton::callback(
                t_lang(localization, "button-toggle-language", language),
                CallbackAction::SetLanguage(language.toggled()).to_string(),
            ),
        ],
        vec![
            InlineKeyboardButton::callback(
                t_lang(localization, "button-support", language),
                CallbackAction::Support.to_string(),
            ),
            InlineKeyboardButton::callback(
                t_lang(localization, "button-about", language),
                CallbackAction::About.to_string(),
            ),
        ],
    ])
}

/// Persistent reply keyboard opening the website as a Web App
pub fn create_quick_access_keyboard(
    localization: &LocalizationManager,
    language: Language,
    website: &Url,
) -> KeyboardMarkup {
    let button = KeyboardButton::new(t_lang(localization, "button-website", language)).request(
        ButtonRequest::WebApp(WebAppInfo {
            url: website.clone(),
        }),
    );
    KeyboardMarkup::new(vec![vec![button]]).resize_keyboard()
}

/// Keyboard with the single "send support request" button
pub fn create_support_request_keyboard(
    localization: &LocalizationManager,
    language: Language,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_lang(localization, "button-send-support-request", language),
        CallbackAction::SendSupportRequest.to_string(),
    )]])
}

/// HTML listing of support sessions for the team
pub fn format_session_list(
    localization: &LocalizationManager,
    language: Language,
    sessions: &[SessionEntry],
) -> String {
    if sessions.is_empty() {
        return t_lang(localization, "team-sessions-empty", language);
    }

    let mut text = format!("{}\n\n", t_lang(localization, "team-sessions-title", language));
    let hidden = sessions.len().saturating_sub(MAX_SESSION_LINES);
    if hidden > 0 {
        text.push_str(&format!("… +{}\n", hidden));
    }
    for entry in &sessions[hidden..] {
        let message_id = entry.message_id.to_string();
        let user_id = entry.user_id.to_string();
        text.push_str(&t_args_lang(
            localization,
            "team-session-line",
            &[("message_id", message_id.as_str()), ("user_id", user_id.as_str())],
            language,
        ));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::{InlineKeyboardButtonKind, MessageId, UserId};

    #[test]
    fn test_welcome_keyboard_toggles_to_other_language() {
        let localization = LocalizationManager::new().unwrap();
        let website = Url::parse("https://example.com").unwrap();

        let keyboard = create_welcome_keyboard(&localization, Language::Ru, &website);
        let toggle = &keyboard.inline_keyboard[0][1];
        assert_eq!(toggle.text, "🇬🇧 English");
        assert_eq!(
            toggle.kind,
            InlineKeyboardButtonKind::CallbackData("language_en".to_string())
        );

        let keyboard = create_welcome_keyboard(&localization, Language::En, &website);
        assert_eq!(
            keyboard.inline_keyboard[0][1].kind,
            InlineKeyboardButtonKind::CallbackData("language_ru".to_string())
        );
    }

    #[test]
    fn test_welcome_message_escapes_name() {
        let localization = LocalizationManager::new().unwrap();
        let text = format_welcome_message(&localization, Language::En, "<Bob>");
        assert!(text.starts_with("Hello &lt;Bob&gt;!"));
    }

    #[test]
    fn test_session_list() {
        let localization = LocalizationManager::new().unwrap();
        assert_eq!(
            format_session_list(&localization, Language::En, &[]),
            "ℹ️ No active support sessions."
        );

        let sessions = vec![SessionEntry {
            message_id: MessageId(42),
            user_id: UserId(7),
            recorded_at: chrono::Utc::now(),
        }];
        let text = format_session_list(&localization, Language::En, &sessions);
        assert!(text.starts_with("📋 <b>Active Support Sessions:</b>"));
        assert!(text.contains("<code>42</code> | <b>User ID:</b> <code>7</code>"));
    }

    #[test]
    fn test_long_session_list_keeps_newest_entries() {
        let localization = LocalizationManager::new().unwrap();
        let sessions: Vec<SessionEntry> = (1..=200)
            .map(|i| SessionEntry {
                message_id: MessageId(i),
                user_id: UserId(1_000_000 + i as u64),
                recorded_at: chrono::Utc::now(),
            })
            .collect();

        let text = format_session_list(&localization, Language::En, &sessions);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[2], "… +150");
        assert_eq!(lines.len(), 3 + MAX_SESSION_LINES);
        assert!(lines[3].contains("<code>151</code>"));
        assert!(lines.last().unwrap().contains("<code>200</code>"));
        assert!(!text.contains("<code>150</code>"));
        assert!(text.chars().count() < 4096);
    }
}
