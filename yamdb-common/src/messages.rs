//! User-facing message table
//!
//! Every message returned to API callers or mailed to users is looked up here
//! by [`MessageKey`]. Russian is the default locale; English is built in, and
//! individual keys can be overridden from the `[messages]` table of the
//! bootstrap config.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::{Error, Result};

/// Identifier of a single user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    ReservedUsername,
    InvalidUsername,
    InvalidEmail,
    UsernameTaken,
    EmailTaken,
    UserNotFound,
    CodeAlreadyUsed,
    WrongCode,
    NotAuthenticated,
    InvalidToken,
    PermissionDenied,
    FieldRequired,
    FieldTooLong,
    InvalidSlug,
    SlugTaken,
    UnknownGenre,
    UnknownCategory,
    GenreNotFound,
    CategoryNotFound,
    TitleNotFound,
    YearInFuture,
    ScoreOutOfRange,
    DuplicateReview,
    ReviewNotFound,
    CommentNotFound,
    InvalidRole,
    MailSubject,
    MailBody,
}

impl MessageKey {
    pub const ALL: [MessageKey; 28] = [
        MessageKey::ReservedUsername,
        MessageKey::InvalidUsername,
        MessageKey::InvalidEmail,
        MessageKey::UsernameTaken,
        MessageKey::EmailTaken,
        MessageKey::UserNotFound,
        MessageKey::CodeAlreadyUsed,
        MessageKey::WrongCode,
        MessageKey::NotAuthenticated,
        MessageKey::InvalidToken,
        MessageKey::PermissionDenied,
        MessageKey::FieldRequired,
        MessageKey::FieldTooLong,
        MessageKey::InvalidSlug,
        MessageKey::SlugTaken,
        MessageKey::UnknownGenre,
        MessageKey::UnknownCategory,
        MessageKey::GenreNotFound,
        MessageKey::CategoryNotFound,
        MessageKey::TitleNotFound,
        MessageKey::YearInFuture,
        MessageKey::ScoreOutOfRange,
        MessageKey::DuplicateReview,
        MessageKey::ReviewNotFound,
        MessageKey::CommentNotFound,
        MessageKey::InvalidRole,
        MessageKey::MailSubject,
        MessageKey::MailBody,
    ];

    /// Config-file spelling of the key
    pub fn as_str(&self) -> &'static str {
        use MessageKey::*;
        match self {
            ReservedUsername => "reserved_username",
            InvalidUsername => "invalid_username",
            InvalidEmail => "invalid_email",
            UsernameTaken => "username_taken",
            EmailTaken => "email_taken",
            UserNotFound => "user_not_found",
            CodeAlreadyUsed => "code_already_used",
            WrongCode => "wrong_code",
            NotAuthenticated => "not_authenticated",
            InvalidToken => "invalid_token",
            PermissionDenied => "permission_denied",
            FieldRequired => "field_required",
            FieldTooLong => "field_too_long",
            InvalidSlug => "invalid_slug",
            SlugTaken => "slug_taken",
            UnknownGenre => "unknown_genre",
            UnknownCategory => "unknown_category",
            GenreNotFound => "genre_not_found",
            CategoryNotFound => "category_not_found",
            TitleNotFound => "title_not_found",
            YearInFuture => "year_in_future",
            ScoreOutOfRange => "score_out_of_range",
            DuplicateReview => "duplicate_review",
            ReviewNotFound => "review_not_found",
            CommentNotFound => "comment_not_found",
            InvalidRole => "invalid_role",
            MailSubject => "mail_subject",
            MailBody => "mail_body",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MessageKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::Config(format!("Unknown message key: {}", s)))
    }
}

/// Built-in message languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

fn builtin(locale: Locale, key: MessageKey) -> &'static str {
    use MessageKey::*;
    match locale {
        Locale::Ru => match key {
            ReservedUsername => "Username \"me\" уже занято.",
            InvalidUsername => "Введите правильное имя пользователя.",
            InvalidEmail => "Введите правильный адрес электронной почты.",
            UsernameTaken => "Пользователь с таким username уже существует.",
            EmailTaken => "Пользователь с таким email уже существует.",
            UserNotFound => "Пользователь не найден.",
            CodeAlreadyUsed => {
                "Данный код подтверждения уже использовался. Получите новый через регистрацию"
            }
            WrongCode => "Неверный код подтверждения",
            NotAuthenticated => "Учетные данные не были предоставлены.",
            InvalidToken => "Данный токен недействителен.",
            PermissionDenied => "У вас недостаточно прав для выполнения данного действия.",
            FieldRequired => "Обязательное поле: {field}.",
            FieldTooLong => "Поле {field} не может быть длиннее {max} символов.",
            InvalidSlug => "Slug может содержать только латинские буквы, цифры, _ и -.",
            SlugTaken => "Запись с таким slug уже существует.",
            UnknownGenre => "Жанр {slug} не существует.",
            UnknownCategory => "Категория {slug} не существует.",
            GenreNotFound => "Жанр не найден.",
            CategoryNotFound => "Категория не найдена.",
            TitleNotFound => "Произведение не найдено.",
            YearInFuture => "Год больше текущего!",
            ScoreOutOfRange => "Оценка должна быть от 1 до 10.",
            DuplicateReview => "Вы уже оставили отзыв на это произведение.",
            ReviewNotFound => "Отзыв не найден.",
            CommentNotFound => "Комментарий не найден.",
            InvalidRole => "Недопустимая роль: {role}.",
            MailSubject => "Код подтверждения YaMDb",
            MailBody => "Ваш код подтверждения: {code}",
        },
        Locale::En => match key {
            ReservedUsername => "Username \"me\" is reserved.",
            InvalidUsername => "Enter a valid username.",
            InvalidEmail => "Enter a valid email address.",
            UsernameTaken => "A user with that username already exists.",
            EmailTaken => "A user with that email already exists.",
            UserNotFound => "User not found.",
            CodeAlreadyUsed => {
                "This confirmation code has already been used. Sign up again to get a new one"
            }
            WrongCode => "Wrong confirmation code",
            NotAuthenticated => "Authentication credentials were not provided.",
            InvalidToken => "Given token is not valid.",
            PermissionDenied => "You do not have permission to perform this action.",
            FieldRequired => "This field is required: {field}.",
            FieldTooLong => "Field {field} must be at most {max} characters.",
            InvalidSlug => "Slug may only contain latin letters, digits, _ and -.",
            SlugTaken => "An entry with that slug already exists.",
            UnknownGenre => "Genre {slug} does not exist.",
            UnknownCategory => "Category {slug} does not exist.",
            GenreNotFound => "Genre not found.",
            CategoryNotFound => "Category not found.",
            TitleNotFound => "Title not found.",
            YearInFuture => "Year is greater than the current year!",
            ScoreOutOfRange => "Score must be between 1 and 10.",
            DuplicateReview => "You have already reviewed this title.",
            ReviewNotFound => "Review not found.",
            CommentNotFound => "Comment not found.",
            InvalidRole => "Invalid role: {role}.",
            MailSubject => "YaMDb confirmation code",
            MailBody => "Your confirmation code: {code}",
        },
    }
}

/// Resolved message table
#[derive(Debug, Clone)]
pub struct Messages {
    table: HashMap<MessageKey, String>,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        let table = MessageKey::ALL
            .iter()
            .map(|key| (*key, builtin(locale, *key).to_string()))
            .collect();
        Self { table }
    }

    /// Replace individual messages, keyed by their config-file spelling
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Result<Self> {
        for (key, text) in overrides {
            let key: MessageKey = key.parse()?;
            self.table.insert(key, text.clone());
        }
        Ok(self)
    }

    pub fn get(&self, key: MessageKey) -> &str {
        self.table.get(&key).map(String::as_str).unwrap_or_default()
    }

    /// Look up a message and substitute `{name}` placeholders
    pub fn render(&self, key: MessageKey, args: &[(&str, &str)]) -> String {
        args.iter().fold(self.get(key).to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }

    pub fn validation(&self, key: MessageKey) -> Error {
        Error::Validation(self.get(key).to_string())
    }

    pub fn not_found(&self, key: MessageKey) -> Error {
        Error::NotFound(self.get(key).to_string())
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_text_in_both_locales() {
        for locale in [Locale::Ru, Locale::En] {
            let messages = Messages::new(locale);
            for key in MessageKey::ALL {
                assert!(!messages.get(key).is_empty(), "{} missing for {:?}", key, locale);
            }
        }
    }

    #[test]
    fn test_key_round_trips_through_config_spelling() {
        for key in MessageKey::ALL {
            assert_eq!(key.as_str().parse::<MessageKey>().unwrap(), key);
        }
        assert!("no_such_key".parse::<MessageKey>().is_err());
    }

    #[test]
    fn test_overrides_replace_single_message() {
        let mut overrides = HashMap::new();
        overrides.insert("wrong_code".to_string(), "nope".to_string());

        let messages = Messages::new(Locale::En).with_overrides(&overrides).unwrap();
        assert_eq!(messages.get(MessageKey::WrongCode), "nope");
        assert_eq!(messages.get(MessageKey::UserNotFound), "User not found.");
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let messages = Messages::new(Locale::En);
        let text = messages.render(MessageKey::FieldTooLong, &[("field", "name"), ("max", "256")]);
        assert_eq!(text, "Field name must be at most 256 characters.");
    }

    #[test]
    fn test_used_and_wrong_code_messages_differ() {
        let messages = Messages::default();
        assert_ne!(
            messages.get(MessageKey::CodeAlreadyUsed),
            messages.get(MessageKey::WrongCode)
        );
    }
}
