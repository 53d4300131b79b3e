use std::fmt;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). This is the address the delivery transport uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

/// Storage surrogate key of a company.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompanyId(pub i64);

/// Storage surrogate key of an owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(pub i64);

/// A registered delivery target belonging to a company.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub company_id: CompanyId,
    pub external_id: ChatId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Company {
    pub id: CompanyId,
    pub owner_id: OwnerId,
    pub token: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub id: OwnerId,
    pub external_id: UserId,
    pub display_name: String,
}

/// Identity of the person registering a company.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerInfo {
    pub external_id: UserId,
    pub display_name: String,
}

/// Everything needed to create a company for an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanyRegistrationInfo {
    pub name: String,
    pub email: String,
    pub owner: OwnerInfo,
}

/// Company view shown to its owner: the company plus its registered chats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanyInfo {
    pub id: CompanyId,
    pub owner_id: OwnerId,
    pub token: String,
    pub name: String,
    pub email: String,
    pub chat_ids: Vec<ChatId>,
}

impl CompanyInfo {
    pub fn new(company: Company, chat_ids: Vec<ChatId>) -> Self {
        Self {
            id: company.id,
            owner_id: company.owner_id,
            token: company.token,
            name: company.name,
            email: company.email,
            chat_ids,
        }
    }
}

/// How the delivery transport should interpret message text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Unspecified,
    MarkdownV2,
    Markdown,
    Html,
}

impl Format {
    /// Case-insensitive and total: anything unknown maps to `Unspecified`.
    pub fn parse(s: &str) -> Self {
        Self::recognize(s).unwrap_or_default()
    }

    /// Strict variant used by input validation; `None` for unknown names.
    pub fn recognize(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "markdownv2" => Some(Self::MarkdownV2),
            "markdown" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::MarkdownV2 => "MarkdownV2",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message pushed by an external caller. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub format: Format,
    pub token: String,
    /// Empty means "every chat of the resolved company".
    pub chat_ids: Vec<ChatId>,
}
