//! Permission groups shipped with the application
use super::registry::AppMode;

pub struct GroupDeclaration {
    pub key: &'static str,
    pub members: &'static [(&'static str, &'static str)],
    pub modes: &'static [AppMode],
}

pub static BUILTIN_GROUPS: &[GroupDeclaration] = &[
    GroupDeclaration {
        key: "consent",
        members: &[("administrate", "Manage consents")],
        modes: &[AppMode::Admin],
    },
    GroupDeclaration {
        key: "orga_presence",
        members: &[
            ("update", "Edit orga presences"),
            ("view", "View orga presences"),
        ],
        modes: &[AppMode::Admin, AppMode::Site],
    },
    GroupDeclaration {
        key: "seating",
        members: &[
            ("administrate", "Administrate seating"),
            ("view", "View seating administration"),
        ],
        modes: &[AppMode::Admin],
    },
    GroupDeclaration {
        key: "shop_order",
        members: &[
            ("cancel", "Cancel orders"),
            ("mark_as_paid", "Mark orders as paid"),
            ("view", "View orders"),
        ],
        modes: &[AppMode::Admin],
    },
    GroupDeclaration {
        key: "tourney_category",
        members: &[
            ("create", "Create tourney categories"),
            ("update", "Edit tourney categories"),
            ("view", "View tourney categories"),
        ],
        modes: &[AppMode::Admin],
    },
];
