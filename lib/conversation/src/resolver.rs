//! Local keyword reply resolution.
//!
//! Replies are chosen by an ordered list of rules evaluated top-down:
//!
//! 1. the greeting, thanks and farewell intents, in that order
//! 2. the reply table, most specific trigger first
//! 3. the default reply
//!
//! All built-in rules match substrings of the lowercased input, so `hi`
//! also fires inside `which`. Table rules are ordered by trigger length
//! (longest first), ties broken by declaration order, so an overlapping
//! trigger such as `library hours` always wins over `library` or `hours`.

use tracing::debug;

/// How a rule matches lowercased input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches a whole word or word sequence; `hi` does not match `this`.
    Word(String),
    /// Matches anywhere in the input.
    Contains(String),
}

impl Pattern {
    /// Creates a whole-word pattern.
    #[must_use]
    pub fn word(trigger: &str) -> Self {
        Self::Word(trigger.trim().to_lowercase())
    }

    /// Creates a substring pattern.
    #[must_use]
    pub fn contains(trigger: &str) -> Self {
        Self::Contains(trigger.trim().to_lowercase())
    }

    /// Returns the lowercase trigger text.
    #[must_use]
    pub fn trigger(&self) -> &str {
        match self {
            Self::Word(trigger) | Self::Contains(trigger) => trigger,
        }
    }

    fn matches(&self, input: &Input<'_>) -> bool {
        match self {
            Self::Contains(trigger) => input.lowered.contains(trigger.as_str()),
            Self::Word(trigger) => {
                let wanted: Vec<&str> = words(trigger).collect();
                !wanted.is_empty()
                    && input
                        .words
                        .windows(wanted.len())
                        .any(|window| window == wanted.as_slice())
            }
        }
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

/// Lowercased input prepared once per resolution.
struct Input<'a> {
    lowered: &'a str,
    words: Vec<&'a str>,
}

/// A fixed group of patterns sharing one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    patterns: Vec<Pattern>,
    reply: String,
}

impl Intent {
    /// Creates an intent.
    #[must_use]
    pub fn new(patterns: Vec<Pattern>, reply: impl Into<String>) -> Self {
        Self {
            patterns,
            reply: reply.into(),
        }
    }

    /// Returns the reply.
    #[must_use]
    pub fn reply(&self) -> &str {
        &self.reply
    }

    fn matches(&self, input: &Input<'_>) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(input))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRule {
    pattern: Pattern,
    reply: String,
    declared: usize,
}

/// Chooses a canned reply for free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseResolver {
    intents: Vec<Intent>,
    table: Vec<TableRule>,
    next_declared: usize,
    default_reply: String,
}

const GREETING_REPLY: &str = "Hello! I'm your AI student services assistant. I'm here to help you with any questions about courses, library, payments, housing, and more!";
const THANKS_REPLY: &str = "You're welcome! Is there anything else I can help you with today?";
const FAREWELL_REPLY: &str = "Goodbye! Feel free to reach out anytime you need assistance with student services. Have a great day!";
const DEFAULT_REPLY: &str = "I'm here to help with student services! You can ask me about library hours, course registration, tuition payments, housing, grades, and more. What would you like to know?";

const STUDENT_SERVICES: &[(&str, &str)] = &[
    (
        "library hours",
        "The library is open from 8 AM - 8 PM, Monday through Friday, and 10 AM - 6 PM on weekends.",
    ),
    (
        "library",
        "Our library offers study spaces, computer labs, and a vast collection of books and digital resources. What would you like to know about the library?",
    ),
    (
        "books",
        "You can search for books using our online catalog. Would you like help finding a specific book or information about borrowing policies?",
    ),
    (
        "register course",
        "You have been registered for Computer Science 101. Registration confirmation has been sent to your email.",
    ),
    (
        "course registration",
        "Course registration is now open for the upcoming semester. You can register online through the student portal.",
    ),
    (
        "courses",
        "We offer a wide range of courses across different departments. What subject are you interested in?",
    ),
    (
        "schedule",
        "Your current class schedule shows 5 courses this semester. Would you like to see specific details or make changes?",
    ),
    (
        "tuition",
        "Your tuition balance for this semester is $3,500. Payment is due by the end of the month.",
    ),
    (
        "fees",
        "Current semester fees include tuition, lab fees, and student services. Total: $3,750. Would you like a detailed breakdown?",
    ),
    (
        "payment",
        "You can pay your fees online through the student portal or at the registrar office. We accept credit cards, bank transfers, and cash.",
    ),
    (
        "financial aid",
        "Financial aid applications are processed by our Financial Aid office. Current status: Application under review.",
    ),
    (
        "housing",
        "Housing applications are now open for next semester. We have dormitories and shared apartments available.",
    ),
    (
        "dormitory",
        "Dormitory rooms are available in various configurations. Single rooms: $800/month, Shared rooms: $500/month.",
    ),
    (
        "room",
        "Your current room assignment is Building A, Room 205. Need to make any changes or report maintenance issues?",
    ),
    (
        "grades",
        "Your current GPA is 3.7. You have 4 As and 1 B this semester. Keep up the good work!",
    ),
    (
        "transcript",
        "Official transcripts can be requested through the Registrar office. Digital copies are available in your student portal.",
    ),
    ("gpa", "Your current cumulative GPA is 3.7 out of 4.0."),
    (
        "help",
        "I can help you with course registration, library services, tuition payments, housing, grades, and general student services. What do you need assistance with?",
    ),
    (
        "contact",
        "You can contact student services at (555) 123-4567 or email support@university.edu. Office hours: 9 AM - 5 PM, Monday-Friday.",
    ),
    (
        "hours",
        "Student services office hours are 9 AM - 5 PM, Monday through Friday. The library has extended hours until 8 PM.",
    ),
    (
        "career",
        "Career services offers job placement assistance, resume reviews, and interview preparation. Would you like to schedule an appointment?",
    ),
    (
        "jobs",
        "Current job openings include internships in technology, business, and healthcare. Check the career portal for details.",
    ),
    (
        "internship",
        "Internship opportunities are available in various fields. Visit career services to explore options and get application guidance.",
    ),
];

impl Default for ResponseResolver {
    fn default() -> Self {
        Self::student_services()
    }
}

impl ResponseResolver {
    /// Creates a resolver with no intents and no table rules.
    #[must_use]
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            intents: Vec::new(),
            table: Vec::new(),
            next_declared: 0,
            default_reply: default_reply.into(),
        }
    }

    /// Creates the student services resolver.
    #[must_use]
    pub fn student_services() -> Self {
        let mut resolver = Self::new(DEFAULT_REPLY)
            .with_intent(Intent::new(
                vec![
                    Pattern::contains("hello"),
                    Pattern::contains("hi"),
                    Pattern::contains("hey"),
                ],
                GREETING_REPLY,
            ))
            .with_intent(Intent::new(vec![Pattern::contains("thank")], THANKS_REPLY))
            .with_intent(Intent::new(
                vec![
                    Pattern::contains("bye"),
                    Pattern::contains("goodbye"),
                    Pattern::contains("see you"),
                ],
                FAREWELL_REPLY,
            ));

        for &(trigger, reply) in STUDENT_SERVICES {
            resolver.add_or_replace(trigger, reply);
        }
        resolver
    }

    /// Appends an intent. Intents are checked in the order added, before
    /// the reply table.
    #[must_use]
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }

    /// Returns the reply for `text`.
    ///
    /// Never fails; unmatched input yields the default reply.
    #[must_use]
    pub fn resolve(&self, text: &str) -> &str {
        let lowered = text.to_lowercase();
        let input = Input {
            lowered: &lowered,
            words: words(&lowered).collect(),
        };

        if let Some(intent) = self.intents.iter().find(|intent| intent.matches(&input)) {
            return intent.reply();
        }

        if let Some(rule) = self.table.iter().find(|rule| rule.pattern.matches(&input)) {
            debug!(trigger = rule.pattern.trigger(), "matched reply table");
            return &rule.reply;
        }

        &self.default_reply
    }

    /// Inserts a substring trigger, or replaces the reply of an existing one.
    ///
    /// Triggers are compared case-insensitively. Returns the previous reply
    /// when one was replaced. Blank triggers are ignored.
    pub fn add_or_replace(&mut self, trigger: &str, reply: impl Into<String>) -> Option<String> {
        let pattern = Pattern::contains(trigger);
        if pattern.trigger().is_empty() {
            return None;
        }

        let reply = reply.into();
        if let Some(rule) = self.table.iter_mut().find(|rule| rule.pattern == pattern) {
            return Some(std::mem::replace(&mut rule.reply, reply));
        }

        self.table.push(TableRule {
            pattern,
            reply,
            declared: self.next_declared,
        });
        self.next_declared += 1;
        self.table.sort_by(|a, b| {
            b.pattern
                .trigger()
                .len()
                .cmp(&a.pattern.trigger().len())
                .then(a.declared.cmp(&b.declared))
        });
        None
    }

    /// Returns the table triggers in evaluation order.
    #[must_use]
    pub fn list_triggers(&self) -> Vec<&str> {
        self.table.iter().map(|rule| rule.pattern.trigger()).collect()
    }

    /// Returns the default reply.
    #[must_use]
    pub fn default_reply(&self) -> &str {
        &self.default_reply
    }
}
