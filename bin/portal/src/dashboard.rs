//! Static service dashboard.

use campus_desk_platform_access::Identity;

/// One service card on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCard {
    pub title: &'static str,
    pub description: &'static str,
}

/// Dashboard heading.
pub const HEADING: &str = "Student Portal Dashboard";

/// Line shown under the welcome greeting.
pub const TAGLINE: &str = "Access all your academic and administrative services in one place.";

/// Hint pointing at the chat assistant.
pub const ASSISTANT_HINT: &str = "Need help? Open the chat to ask about library hours, course registration, fees, and much more!";

/// The services offered by the portal, in display order.
pub const SERVICES: [ServiceCard; 6] = [
    ServiceCard {
        title: "Course Registration",
        description: "Register for courses and manage your academic schedule",
    },
    ServiceCard {
        title: "Library Services",
        description: "Check library hours, search catalog, and manage reservations",
    },
    ServiceCard {
        title: "Financial Services",
        description: "View tuition fees, payment options, and financial aid",
    },
    ServiceCard {
        title: "Academic Records",
        description: "Access transcripts, grades, and academic history",
    },
    ServiceCard {
        title: "Housing Services",
        description: "Manage dormitory applications and housing arrangements",
    },
    ServiceCard {
        title: "Career Services",
        description: "Find internships, job opportunities, and career guidance",
    },
];

/// Returns the welcome line for a signed-in student.
#[must_use]
pub fn welcome_line(identity: &Identity) -> String {
    match identity.display_name() {
        Some(name) => format!("Welcome, {name}"),
        None => "Welcome".to_string(),
    }
}
