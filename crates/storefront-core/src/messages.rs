//! Client-facing messages in the deployment's configured language.

use std::fmt;
use std::str::FromStr;

/// Language used for every message returned to API clients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

/// Messages the upload API can return to a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
    NoFileAttached,
    FileTooSmall,
    FileTooLarge,
    InvalidImage,
    BadRequest,
    NotFound,
    InternalError,
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept bare language tags as well as region variants ("ru-RU", "en_US").
        let language = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match language.as_str() {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            _ => Err(UnsupportedLocale(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Ru => f.write_str("ru"),
        }
    }
}

impl Locale {
    pub fn message(self, key: MessageKey) -> &'static str {
        match self {
            Locale::En => match key {
                MessageKey::NoFileAttached => "No file attached",
                MessageKey::FileTooSmall => "File is too small",
                MessageKey::FileTooLarge => "File is too large",
                MessageKey::InvalidImage => "Invalid image",
                MessageKey::BadRequest => "Bad request",
                MessageKey::NotFound => "Not found",
                MessageKey::InternalError => "Internal server error",
            },
            Locale::Ru => match key {
                MessageKey::NoFileAttached => "Файл не загружен",
                MessageKey::FileTooSmall => "Файл слишком маленький",
                MessageKey::FileTooLarge => "Файл слишком большой",
                MessageKey::InvalidImage => "Некорректное изображение",
                MessageKey::BadRequest => "Некорректный запрос",
                MessageKey::NotFound => "Не найдено",
                MessageKey::InternalError => "На сервере произошла ошибка",
            },
        }
    }
}
