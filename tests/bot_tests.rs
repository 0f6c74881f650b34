//! # Bot Flow Tests
//!
//! User-facing flows driven the way the handlers drive them: keyboards, callback
//! data, language switching and the support request round trip.


use reqwest::Url;
use support_relay_bot::bot::ui_builder::{
    create_support_request_keyboard, create_welcome_keyboard, format_welcome_message,
};
use support_relay_bot::bot::message_handler::process_user_message;
use support_relay_bot::bot::{CallbackAction, Command};
use support_relay_bot::language::Language;
use support_relay_bot::localization::t_lang;
use support_relay_bot::relay::{InboundContent, SupportUser};
use teloxide::types::{InlineKeyboardButtonKind, UserId};
use teloxide::utils::command::BotCommands;
use test_helpers::{create_relay, localization, TEAM_MEMBER};

fn callback_data(kind: &InlineKeyboardButtonKind) -> &str {
    match kind {
        InlineKeyboardButtonKind::CallbackData(data) => data,
        other => panic!("expected callback data, got {:?}", other),
    }
}

#[tokio::test]
async fn test_language_toggle_switches_support_and_about_texts() {
    let localization = localization();
    let (_channel, relay) = create_relay();
    let website = Url::parse("https://montnoir.ru").unwrap();
    let user = UserId(501);

    // /start resets the user to Russian and shows the Russian welcome
    relay.set_language(user, Language::Ru);
    let language = relay.language(user);
    let welcome = format_welcome_message(&localization, language, "Olga");
    assert!(welcome.starts_with("Привет Olga!"));

    let keyboard = create_welcome_keyboard(&localization, language, &website);
    let toggle = &keyboard.inline_keyboard[0][1];

    // Pressing the toggle button
    let action: CallbackAction = callback_data(&toggle.kind).parse().unwrap();
    assert_eq!(action, CallbackAction::SetLanguage(Language::En));
    if let CallbackAction::SetLanguage(language) = action {
        relay.set_language(user, language);
    }

    let language = relay.language(user);
    assert_eq!(language, Language::En);
    assert_eq!(
        t_lang(&localization, "support-intro", language),
        "To contact support, please click the button below."
    );
    assert!(t_lang(&localization, "about-text", language)
        .starts_with("Welcome to the Telegram version of our store."));

    // And back
    let keyboard = create_welcome_keyboard(&localization, language, &website);
    let action: CallbackAction = callback_data(&keyboard.inline_keyboard[0][1].kind)
        .parse()
        .unwrap();
    assert_eq!(action, CallbackAction::SetLanguage(Language::Ru));
}

#[tokio::test]
async fn test_unseen_user_defaults_to_russian() {
    let (_channel, relay) = create_relay();
    assert_eq!(relay.language(UserId(1)), Language::Ru);

    relay.set_language(UserId(1), Language::En);
    assert_eq!(relay.language(UserId(1)), Language::En);
    assert_eq!(relay.language(UserId(2)), Language::Ru);
}

#[tokio::test]
async fn test_support_button_round_trip() {
    let localization = localization();
    let (channel, relay) = create_relay();
    let user = SupportUser {
        id: UserId(600),
        first_name: "Pavel".to_string(),
        username: None,
    };

    // The support prompt carries the "send support request" action
    let keyboard = create_support_request_keyboard(&localization, Language::Ru);
    let action: CallbackAction = callback_data(&keyboard.inline_keyboard[0][0].kind)
        .parse()
        .unwrap();
    assert_eq!(action, CallbackAction::SendSupportRequest);

    assert!(!relay.is_awaiting(user.id).await.unwrap());
    relay.begin_support_request(user.id).await.unwrap();
    assert!(relay.is_awaiting(user.id).await.unwrap());

    // A sticker is not forwarded and the user stays prompted
    assert!(relay.submit(&user, &InboundContent::Other).await.is_err());
    assert!(relay.is_awaiting(user.id).await.unwrap());

    let ticket = relay
        .submit(&user, &InboundContent::Text("Size exchange please".to_string()))
        .await
        .unwrap();
    assert!(!relay.is_awaiting(user.id).await.unwrap());

    let entries = relay.list_sessions(TEAM_MEMBER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_id, user.id);
    assert_eq!(entries[0].message_id, ticket.message_id);

    relay
        .reply(
            TEAM_MEMBER,
            Some(ticket.message_id),
            &InboundContent::Text("Done".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(channel.sent_count(), 2);
}

#[tokio::test]
async fn test_private_messages_get_the_right_acknowledgement() {
    let (channel, relay) = create_relay();
    let user = SupportUser {
        id: UserId(610),
        first_name: "Nina".to_string(),
        username: Some("nina".to_string()),
    };
    let text = InboundContent::Text("My parcel is late".to_string());

    // Without asking for support first the user gets a hint, nothing is forwarded
    assert_eq!(
        process_user_message(&relay, &user, &text).await.unwrap(),
        "support-use-command"
    );
    assert_eq!(channel.sent_count(), 0);

    relay.begin_support_request(user.id).await.unwrap();

    // A sticker produces a re-prompt, not a forwarded message
    assert_eq!(
        process_user_message(&relay, &user, &InboundContent::Other)
            .await
            .unwrap(),
        "support-unsupported-content"
    );
    assert_eq!(channel.sent_count(), 0);
    assert!(relay.is_awaiting(user.id).await.unwrap());

    channel.set_failing(true);
    assert_eq!(
        process_user_message(&relay, &user, &text).await.unwrap(),
        "support-forward-failed"
    );
    assert!(relay.is_awaiting(user.id).await.unwrap());

    channel.set_failing(false);
    assert_eq!(
        process_user_message(&relay, &user, &text).await.unwrap(),
        "support-forwarded"
    );
    assert_eq!(channel.sent_count(), 1);
    assert!(!relay.is_awaiting(user.id).await.unwrap());

    // Back to idle: the next message only gets the hint
    assert_eq!(
        process_user_message(&relay, &user, &text).await.unwrap(),
        "support-use-command"
    );
    assert_eq!(channel.sent_count(), 1);
}

#[test]
fn test_registered_commands() {
    let commands = Command::bot_commands();
    let names: Vec<&str> = commands
        .iter()
        .map(|c| c.command.trim_start_matches('/'))
        .collect();
    assert_eq!(names, vec!["start", "support", "about", "list"]);
}
