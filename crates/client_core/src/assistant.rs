//! Rule-based help assistant. Messages are matched against ordered keyword
//! groups; the first group with a hit answers.

pub const DEFAULT_USER_NAME: &str = "User";
/// Keyword words at least this long also match longer words that start with
/// them ("bill" hits "billing"). Shorter ones need the whole word.
pub const PREFIX_MATCH_MIN_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Greeting,
    Accounts,
    Transactions,
    Budgets,
    Bills,
    Rewards,
    Insights,
    Security,
    Help,
}

#[derive(Debug, Clone, Copy)]
enum Reply {
    Greeting,
    Text(&'static str),
}

struct RuleGroup {
    topic: Topic,
    keywords: &'static [&'static str],
    reply: Reply,
}

const RULES: &[RuleGroup] = &[
    RuleGroup {
        topic: Topic::Greeting,
        keywords: &[
            "hi", "hello", "hey", "good morning", "good evening", "good afternoon", "hai", "hii",
            "yo", "what's up", "sup", "greetings", "welcome", "how are you", "how r u", "gm",
            "ge", "gn",
        ],
        reply: Reply::Greeting,
    },
    RuleGroup {
        topic: Topic::Accounts,
        keywords: &[
            "account", "accounts", "balance", "bank account", "add account", "create account",
            "delete account", "remove account", "checking", "savings", "investment",
            "account type", "how many accounts", "account list", "edit account",
            "update account", "primary account", "secondary account",
        ],
        reply: Reply::Text(
            "Go to Accounts section to add, delete, edit or manage accounts. You can track balances and account types easily.",
        ),
    },
    RuleGroup {
        topic: Topic::Transactions,
        keywords: &[
            "transaction", "transactions", "payment", "history", "credit", "debit", "transfer",
            "send money", "receive money", "add transaction", "edit transaction",
            "delete transaction", "import", "export", "csv", "pdf", "download report",
            "upload csv", "recent payments", "transaction list", "money flow",
        ],
        reply: Reply::Text(
            "Transactions page allows you to add, edit, categorize, import CSV, export PDF and monitor full history.",
        ),
    },
    RuleGroup {
        topic: Topic::Budgets,
        keywords: &[
            "budget", "budgets", "limit", "spending limit", "expense limit", "budget exceeded",
            "budget alert", "monthly budget", "yearly budget", "set limit", "category limit",
        ],
        reply: Reply::Text(
            "Budgets help control your spending. Set category limits and track visual charts to avoid overspending.",
        ),
    },
    RuleGroup {
        topic: Topic::Bills,
        keywords: &[
            "bill", "bills", "due", "overdue", "due date", "auto pay", "autopay",
            "bill reminder", "electricity bill", "rent", "subscription", "water bill",
            "internet bill", "pay bill", "bill status",
        ],
        reply: Reply::Text(
            "Bills section tracks due dates, overdue bills and auto-pay status. Enable reminders to avoid late payments.",
        ),
    },
    RuleGroup {
        topic: Topic::Rewards,
        keywords: &[
            "reward", "rewards", "points", "redeem", "cashback", "loyalty", "reward balance",
            "reward value", "convert points", "how many points", "redeem value",
        ],
        reply: Reply::Text(
            "You earn reward points for transactions. 10 points = ₹1. Redeem inside Rewards section anytime.",
        ),
    },
    RuleGroup {
        topic: Topic::Insights,
        keywords: &[
            "insight", "insights", "analysis", "monthly report", "burn rate", "top merchants",
            "cashflow", "income", "expense", "financial report", "spending chart", "analytics",
        ],
        reply: Reply::Text(
            "Insights page provides income vs expenses, burn rate, top merchants and spending analytics.",
        ),
    },
    RuleGroup {
        topic: Topic::Security,
        keywords: &[
            "password", "change password", "reset password", "forgot password", "security",
            "two factor", "2fa", "authentication", "otp", "login issue", "secure",
            "account safety",
        ],
        reply: Reply::Text(
            "Manage security inside Settings → Enable 2FA and change password for extra protection.",
        ),
    },
    RuleGroup {
        topic: Topic::Help,
        keywords: &[
            "help", "support", "guide", "how to", "what is", "explain", "assist", "problem",
            "issue", "why", "error", "not working", "bug", "confused", "info",
        ],
        reply: Reply::Text(
            "I can assist you with Accounts, Transactions, Budgets, Bills, Rewards, Insights and Security settings.",
        ),
    },
];

/// Lowercased words; apostrophes stay inside a word so "what's" is one token.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|word| word.trim_matches('\''))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(word: &str, keyword: &str) -> bool {
    if keyword.chars().count() < PREFIX_MATCH_MIN_CHARS {
        word == keyword
    } else {
        word.starts_with(keyword)
    }
}

fn contains_phrase(words: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty()
        && words.windows(phrase.len()).any(|window| {
            window
                .iter()
                .zip(phrase)
                .all(|(word, keyword)| word_matches(word, keyword))
        })
}

struct CompiledRule {
    topic: Topic,
    phrases: Vec<Vec<String>>,
    reply: Reply,
}

pub struct Assistant {
    user_name: String,
    rules: Vec<CompiledRule>,
}

impl Assistant {
    pub fn new(user_name: Option<&str>) -> Self {
        let user_name = user_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_USER_NAME)
            .to_string();

        let rules = RULES
            .iter()
            .map(|group| CompiledRule {
                topic: group.topic,
                phrases: group.keywords.iter().map(|k| tokenize(k)).collect(),
                reply: group.reply,
            })
            .collect();

        Self { user_name, rules }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn greeting(&self) -> String {
        format!("Hi {} 👋 How can I help you today?", self.user_name)
    }

    pub fn classify(&self, message: &str) -> Option<Topic> {
        self.matching_rule(message).map(|rule| rule.topic)
    }

    pub fn reply(&self, message: &str) -> String {
        match self.matching_rule(message).map(|rule| rule.reply) {
            Some(Reply::Greeting) => self.greeting(),
            Some(Reply::Text(text)) => text.to_string(),
            None => format!(
                "Sorry {}, I couldn't understand. Please ask about accounts, transactions, budgets or rewards.",
                self.user_name
            ),
        }
    }

    fn matching_rule(&self, message: &str) -> Option<&CompiledRule> {
        let words = tokenize(message);
        self.rules.iter().find(|rule| {
            rule.phrases
                .iter()
                .any(|phrase| contains_phrase(&words, phrase))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// A chat transcript that opens with the assistant's greeting.
pub struct Conversation {
    assistant: Assistant,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(assistant: Assistant) -> Self {
        let turns = vec![Turn {
            speaker: Speaker::Bot,
            text: assistant.greeting(),
        }];
        Self { assistant, turns }
    }

    /// Returns the bot's answer, or `None` when the input is blank.
    pub fn send(&mut self, input: &str) -> Option<&str> {
        if input.trim().is_empty() {
            return None;
        }
        let reply = self.assistant.reply(input);
        self.turns.push(Turn {
            speaker: Speaker::User,
            text: input.to_string(),
        });
        self.turns.push(Turn {
            speaker: Speaker::Bot,
            text: reply,
        });
        self.turns.last().map(|turn| turn.text.as_str())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_uses_name_or_default() {
        assert_eq!(
            Assistant::new(Some("Asha")).reply("Hello there"),
            "Hi Asha 👋 How can I help you today?"
        );
        assert_eq!(Assistant::new(None).user_name(), "User");
        assert_eq!(Assistant::new(Some("  ")).user_name(), "User");
    }

    #[test]
    fn groups_are_checked_in_order() {
        let bot = Assistant::new(None);
        assert_eq!(bot.classify("hi, what's my balance?"), Some(Topic::Greeting));
        assert_eq!(bot.classify("What's my BALANCE?"), Some(Topic::Accounts));
        assert_eq!(bot.classify("show my balance"), Some(Topic::Accounts));
        assert_eq!(bot.classify("I forgot password"), Some(Topic::Security));
        assert_eq!(bot.classify("how many points do I have"), Some(Topic::Rewards));
    }

    #[test]
    fn short_keywords_need_whole_words() {
        let bot = Assistant::new(None);
        // "budget" contains "ge", "support" contains "sup", "history" contains "hi"
        assert_eq!(bot.classify("set a budget"), Some(Topic::Budgets));
        assert_eq!(bot.classify("contact support"), Some(Topic::Help));
        assert_eq!(bot.classify("payment history"), Some(Topic::Transactions));
        assert_eq!(bot.classify("the electricity is due"), Some(Topic::Bills));
    }

    #[test]
    fn longer_keywords_match_inflected_words() {
        let bot = Assistant::new(None);
        assert_eq!(bot.classify("show my payments"), Some(Topic::Transactions));
        assert_eq!(bot.classify("my expenses this month"), Some(Topic::Insights));
        assert_eq!(bot.classify("budgeting tips"), Some(Topic::Budgets));
        assert_eq!(bot.classify("billing problem"), Some(Topic::Bills));
        assert_eq!(bot.classify("my bonus was credited"), Some(Topic::Transactions));
    }

    #[test]
    fn multi_word_phrases_must_be_contiguous() {
        let bot = Assistant::new(None);
        assert_eq!(bot.classify("my burn rate please"), Some(Topic::Insights));
        assert_eq!(bot.classify("rate the burn"), None);
    }

    #[test]
    fn unknown_message_falls_back() {
        let reply = Assistant::new(Some("Ravi")).reply("quantum entanglement");
        assert!(reply.starts_with("Sorry Ravi, I couldn't understand."));
    }

    #[test]
    fn conversation_ignores_blank_input() {
        let mut chat = Conversation::new(Assistant::new(Some("Asha")));
        assert_eq!(chat.turns().len(), 1);
        assert!(chat.send("   ").is_none());
        assert_eq!(chat.turns().len(), 1);

        let reply = chat.send("how do I redeem points").map(str::to_string);
        assert!(reply.is_some_and(|r| r.contains("10 points = ₹1")));
        assert_eq!(chat.turns().len(), 3);
        assert_eq!(chat.turns()[1].speaker, Speaker::User);
    }
}
