//! Bot command surface: maps commands and dialogue text onto the management use cases.

use std::sync::Arc;

use crate::{
    chat::ChatService,
    company::CompanyService,
    conversation::{Conversation, ConversationStore},
    domain::{ChatId, CompanyRegistrationInfo, OwnerInfo},
    errors::{ChatError, CompanyError, RegistrationError},
    formatting::{escape_html, format_company_info},
    messaging::types::{Command, IncomingUpdate, Reply, TextMessage},
    registration::RegistrationService,
};

pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Let's try again";
const NO_COMPANY: &str =
    "<b>You have no company</b>\n\nYou can register a new company with the /register command";
const ALREADY_HAVE_COMPANY: &str = "You already have a company";

const HELP: &str = "Available commands:
/help - show this message
/getchatid - show chat ID
/register - register new company
/cancel - abort registration
/getcompany - show registered company
/updatetoken - update company token
/addchat {chat_id} - add chat to company, for example: /addchat 123456789
/deletechat {chat_id} - delete chat from company, for example: /deletechat 123456789
/deletecompany - delete company and all of its chats";

const START: &str = "Hi! This bot relays webhook notifications to your Telegram chats.

Register your company with /register to get an access token, then add the chats that should receive notifications with /addchat.

Send /help to see every command.";

pub struct CommandService {
    registration: Arc<RegistrationService>,
    companies: Arc<CompanyService>,
    chats: Arc<ChatService>,
    conversations: Arc<dyn ConversationStore>,
}

impl CommandService {
    pub fn new(
        registration: Arc<RegistrationService>,
        companies: Arc<CompanyService>,
        chats: Arc<ChatService>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            registration,
            companies,
            chats,
            conversations,
        }
    }

    /// Handle one update. Updates from the same chat are serialized by the conversation
    /// lock. Plain text outside a dialogue gets no reply.
    pub async fn handle(&self, update: IncomingUpdate) -> Option<Reply> {
        let chat_id = update.chat_id();
        let mut slot = self.conversations.lock(chat_id).await;
        let reply = match update {
            IncomingUpdate::Command(cmd) => Some(self.handle_command(cmd, &mut slot).await),
            IncomingUpdate::Text(msg) => self.handle_text(msg, &mut slot).await,
        };
        let finished = slot.is_none();
        drop(slot);
        if finished {
            self.conversations.release(chat_id).await;
        }
        reply
    }

    async fn handle_command(&self, cmd: Command, slot: &mut Option<Conversation>) -> Reply {
        let chat_id = cmd.chat_id;
        match cmd.name.as_str() {
            "help" => Reply::plain(chat_id, HELP),
            "start" => Reply::plain(chat_id, START),
            "getchatid" => Reply::plain(chat_id, format!("Chat ID: {}", chat_id.0)),
            "register" => self.start_registration(&cmd, slot).await,
            "cancel" => match slot.take() {
                Some(_) => Reply::plain(chat_id, "Registration cancelled"),
                None => Reply::plain(chat_id, "Nothing to cancel"),
            },
            "getcompany" => self.company_info(&cmd).await,
            "updatetoken" => self.update_token(&cmd).await,
            "addchat" => self.add_chat(&cmd).await,
            "deletechat" => self.delete_chat(&cmd).await,
            "deletecompany" => self.delete_company(&cmd).await,
            _ => Reply::plain(chat_id, "I don't know that command"),
        }
    }

    async fn handle_text(
        &self,
        msg: TextMessage,
        slot: &mut Option<Conversation>,
    ) -> Option<Reply> {
        let chat_id = msg.chat_id;
        match slot.take()? {
            Conversation::AwaitCompanyName => {
                *slot = Some(Conversation::AwaitEmail {
                    company_name: msg.text.trim().to_string(),
                    owner: OwnerInfo {
                        external_id: msg.user_id,
                        display_name: msg.username.clone().unwrap_or_default(),
                    },
                });
                Some(Reply::prompt(chat_id, "Enter email:"))
            }
            Conversation::AwaitEmail {
                company_name,
                owner,
            } => {
                let info = CompanyRegistrationInfo {
                    name: company_name,
                    email: msg.text.trim().to_string(),
                    owner,
                };
                Some(self.finish_registration(chat_id, info).await)
            }
        }
    }

    async fn start_registration(&self, cmd: &Command, slot: &mut Option<Conversation>) -> Reply {
        match self.registration.check_company_exists(cmd.user_id).await {
            Ok(true) => Reply::plain(cmd.chat_id, ALREADY_HAVE_COMPANY),
            Ok(false) => {
                *slot = Some(Conversation::AwaitCompanyName);
                Reply::prompt(cmd.chat_id, "Enter company name:")
            }
            Err(e) => {
                tracing::error!(op = "commands.register", error = %e, "check company exists");
                Reply::plain(cmd.chat_id, SOMETHING_WENT_WRONG)
            }
        }
    }

    async fn finish_registration(&self, chat_id: ChatId, info: CompanyRegistrationInfo) -> Reply {
        match self.registration.register_company(info).await {
            Ok(company) => Reply::html(
                chat_id,
                format!(
                    "You are registered!\n\nYour token: <code>{}</code>\nAdd chats with /addchat {{chat_id}}",
                    escape_html(&company.token)
                ),
            ),
            Err(RegistrationError::CompanyAlreadyExists) => {
                tracing::debug!(op = "commands.register", "company already exists");
                Reply::plain(chat_id, ALREADY_HAVE_COMPANY)
            }
            Err(RegistrationError::Invalid(reason)) => Reply::plain(
                chat_id,
                format!("Validation error: {reason}. Use /register to try again"),
            ),
            Err(e) => {
                tracing::error!(op = "commands.register", error = %e, "register company");
                Reply::plain(chat_id, SOMETHING_WENT_WRONG)
            }
        }
    }

    async fn company_info(&self, cmd: &Command) -> Reply {
        match self.companies.company_by_owner(cmd.user_id).await {
            Ok(info) => Reply::html(cmd.chat_id, format_company_info(&info)),
            Err(e) => company_error_reply(cmd.chat_id, "commands.getcompany", e),
        }
    }

    async fn update_token(&self, cmd: &Command) -> Reply {
        match self.companies.update_token(cmd.user_id).await {
            Ok(token) => Reply::html(
                cmd.chat_id,
                format!(
                    "Token updated. The old token no longer works.\n\nNew token: <code>{}</code>",
                    escape_html(&token)
                ),
            ),
            Err(e) => company_error_reply(cmd.chat_id, "commands.updatetoken", e),
        }
    }

    async fn delete_company(&self, cmd: &Command) -> Reply {
        match self.companies.delete_company(cmd.user_id).await {
            Ok(()) => Reply::plain(cmd.chat_id, "Company deleted"),
            Err(e) => company_error_reply(cmd.chat_id, "commands.deletecompany", e),
        }
    }

    async fn add_chat(&self, cmd: &Command) -> Reply {
        let Some(target) = parse_chat_id(&cmd.args) else {
            return Reply::plain(cmd.chat_id, "Wrong chat id");
        };
        match self.chats.add_chat(cmd.user_id, target).await {
            Ok(_) => Reply::plain(cmd.chat_id, "Chat added"),
            Err(e) => chat_error_reply(cmd.chat_id, "commands.addchat", e),
        }
    }

    async fn delete_chat(&self, cmd: &Command) -> Reply {
        let Some(target) = parse_chat_id(&cmd.args) else {
            return Reply::plain(cmd.chat_id, "Wrong chat id");
        };
        match self.chats.delete_chat(cmd.user_id, target).await {
            Ok(()) => Reply::plain(cmd.chat_id, "Chat deleted"),
            Err(e) => chat_error_reply(cmd.chat_id, "commands.deletechat", e),
        }
    }
}

fn parse_chat_id(args: &str) -> Option<ChatId> {
    args.trim().parse::<i64>().ok().map(ChatId)
}

fn company_error_reply(chat_id: ChatId, op: &str, e: CompanyError) -> Reply {
    match e {
        CompanyError::CompanyNotFound => Reply::html(chat_id, NO_COMPANY),
        CompanyError::Storage(e) => {
            tracing::error!(op, error = %e, "company command failed");
            Reply::plain(chat_id, SOMETHING_WENT_WRONG)
        }
    }
}

fn chat_error_reply(chat_id: ChatId, op: &str, e: ChatError) -> Reply {
    match e {
        ChatError::CompanyNotFound => Reply::html(chat_id, NO_COMPANY),
        ChatError::ChatNotFound => Reply::plain(chat_id, "Chat not found"),
        ChatError::ChatAlreadyAdded => Reply::plain(chat_id, "Chat is already added"),
        ChatError::Storage(e) => {
            tracing::error!(op, error = %e, "chat command failed");
            Reply::plain(chat_id, SOMETHING_WENT_WRONG)
        }
    }
}
