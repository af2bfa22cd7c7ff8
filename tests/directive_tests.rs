use omnisummary::core::models::DestinationScope;
use omnisummary::directive::parse_directive;
use omnisummary::errors::BotError;

#[test]
fn test_plain_url_defaults_to_personal_scope() {
    let directive = parse_directive("<@U0BOT> https://example.com/article").unwrap();

    assert_eq!(directive.target_url, "https://example.com/article");
    assert_eq!(directive.destination_scope, DestinationScope::Personal);
    assert_eq!(directive.opening_override, None);
}

#[test]
fn test_business_keyword_widens_scope() {
    let directive =
        parse_directive("<@U0BOT> https://example.com/a 회사 채널에도 보내줘").unwrap();

    assert_eq!(directive.target_url, "https://example.com/a");
    assert_eq!(
        directive.destination_scope,
        DestinationScope::PersonalAndBusiness
    );
    assert_eq!(directive.opening_override, None);
}

#[test]
fn test_all_business_keyword_variants() {
    for keyword in ["비즈니스 채널", "업무 채널", "전체 채널", "Business Channel"] {
        let text = format!("<@U0BOT> https://example.com/a {keyword}에 공유해줘");
        let directive = parse_directive(&text).unwrap();
        assert_eq!(
            directive.destination_scope,
            DestinationScope::PersonalAndBusiness,
            "keyword {keyword} should widen the scope"
        );
    }
}

#[test]
fn test_korean_opening_override() {
    let directive =
        parse_directive("<@U0BOT> https://example.com/a AWS 신기능이네요로 시작해줘").unwrap();

    assert_eq!(
        directive.opening_override.as_deref(),
        Some("AWS 신기능이네요")
    );
    // An opening override alone does not touch the destination scope.
    assert_eq!(directive.destination_scope, DestinationScope::Personal);
}

#[test]
fn test_english_opening_override() {
    let directive =
        parse_directive("<@U0BOT> https://example.com/a start with \"Big news today\"").unwrap();

    assert_eq!(directive.opening_override.as_deref(), Some("Big news today"));
}

#[test]
fn test_missing_url_is_an_error() {
    let result = parse_directive("<@U0BOT> 요약해줘");
    assert!(matches!(result, Err(BotError::MissingUrl)));
}

#[test]
fn test_slack_link_syntax_is_unwrapped() {
    // Slack renders pasted links as <url> or <url|label>.
    let directive = parse_directive("<@U0BOT> <https://example.com/a> 요약해줘").unwrap();
    assert_eq!(directive.target_url, "https://example.com/a");

    let directive =
        parse_directive("<@U0BOT> <https://example.com/a|example.com> 회사 채널에도 보내줘")
            .unwrap();
    assert_eq!(directive.target_url, "https://example.com/a");
    assert_eq!(
        directive.destination_scope,
        DestinationScope::PersonalAndBusiness
    );
}

#[test]
fn test_first_url_wins_and_trailing_punctuation_is_trimmed() {
    let directive = parse_directive(
        "<@U0BOT> check https://example.com/first. also https://example.com/second",
    )
    .unwrap();
    assert_eq!(directive.target_url, "https://example.com/first");
}

#[test]
fn test_balanced_parentheses_in_url_are_kept() {
    let directive = parse_directive(
        "<@U0BOT> https://en.wikipedia.org/wiki/Rust_(programming_language)",
    )
    .unwrap();
    assert_eq!(
        directive.target_url,
        "https://en.wikipedia.org/wiki/Rust_(programming_language)"
    );
}

#[test]
fn test_unbalanced_closing_paren_is_stripped() {
    // The URL is inside the sentence's parentheses, not its own.
    let directive = parse_directive("<@U0BOT> (see https://example.com/a).").unwrap();
    assert_eq!(directive.target_url, "https://example.com/a");

    let directive = parse_directive(
        "<@U0BOT> (that is https://en.wikipedia.org/wiki/Rust_(programming_language))",
    )
    .unwrap();
    assert_eq!(
        directive.target_url,
        "https://en.wikipedia.org/wiki/Rust_(programming_language)"
    );
}

#[test]
fn test_mention_token_never_parsed_as_directive_text() {
    // The bot mention itself must not leak into keyword matching.
    let directive = parse_directive("<@U0BOT|business channel> https://example.com/a").unwrap();
    assert_eq!(directive.destination_scope, DestinationScope::Personal);
}
