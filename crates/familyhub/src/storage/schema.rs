//! `SQLite` schema definitions for familyhub.
//!
//! Statements are grouped by the schema version that introduced them.

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Families and members.
pub const CREATE_FAMILIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS families (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the members table.
pub const CREATE_MEMBERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    user_id TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    role TEXT NOT NULL,
    is_mother INTEGER NOT NULL DEFAULT 0,
    phone TEXT
)
";

/// Login sessions; only the BLAKE3 hash of the token is stored.
pub const CREATE_SESSIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
)
";

/// One display-control row per family.
pub const CREATE_DISPLAY_CONTROL_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS display_control (
    family_id INTEGER PRIMARY KEY REFERENCES families(id),
    current_view TEXT NOT NULL,
    content_id INTEGER,
    content_data TEXT,
    triggered_by INTEGER,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the display settings table.
pub const CREATE_DISPLAY_SETTINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS display_settings (
    family_id INTEGER PRIMARY KEY REFERENCES families(id),
    idle_timeout_secs INTEGER,
    photo_interval_secs INTEGER,
    night_mode_start TEXT,
    night_mode_end TEXT
)
";

/// SQL statement to create the messages table.
pub const CREATE_MESSAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    from_member_id INTEGER,
    text TEXT NOT NULL,
    is_urgent INTEGER NOT NULL DEFAULT 0,
    is_read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    read_at TEXT
)
";

/// Index for the unread-messages queries.
pub const CREATE_MESSAGES_UNREAD_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_messages_family_unread ON messages(family_id, is_read)
";

/// SQL statement to create the tutorials table.
pub const CREATE_TUTORIALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tutorials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    title TEXT NOT NULL,
    content_type TEXT NOT NULL,
    video_url TEXT,
    steps TEXT NOT NULL DEFAULT '[]',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the gallery photos table.
pub const CREATE_PHOTOS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    url TEXT NOT NULL,
    caption TEXT,
    display_order INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1
)
";

/// SQL statement to create the medications table.
pub const CREATE_MEDICATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS medications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    name TEXT NOT NULL,
    dosage TEXT,
    time_window TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
)
";

/// One row per medication, day and window.
pub const CREATE_DOSE_LOGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dose_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    medication_id INTEGER NOT NULL REFERENCES medications(id),
    date TEXT NOT NULL,
    time_window TEXT NOT NULL,
    status TEXT NOT NULL,
    logged_by INTEGER,
    UNIQUE (medication_id, date, time_window)
)
";

/// SQL statement to create the tasks table.
pub const CREATE_TASKS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    title TEXT NOT NULL,
    assigned_to INTEGER,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the shopping items table.
pub const CREATE_SHOPPING_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS shopping_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    name TEXT NOT NULL,
    quantity TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// One row per family and day.
pub const CREATE_ROTATION_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rotation_schedule (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    date TEXT NOT NULL,
    member_id INTEGER NOT NULL REFERENCES members(id),
    note TEXT,
    UNIQUE (family_id, date)
)
";

/// Calendar events; `starts_at` is local `YYYY-MM-DDTHH:MM:SS` text.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    family_id INTEGER NOT NULL REFERENCES families(id),
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    starts_at TEXT NOT NULL,
    responsible_member_id INTEGER REFERENCES members(id),
    visible_to_mother INTEGER NOT NULL DEFAULT 1
)
";

/// Index for the upcoming-events query.
pub const CREATE_EVENTS_START_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_events_family_start ON events (family_id, starts_at)
";

/// Version 1: accounts, sessions and everything the mom display reads.
pub const V1_STATEMENTS: &[&str] = &[
    CREATE_FAMILIES_TABLE,
    CREATE_MEMBERS_TABLE,
    CREATE_SESSIONS_TABLE,
    CREATE_DISPLAY_CONTROL_TABLE,
    CREATE_DISPLAY_SETTINGS_TABLE,
    CREATE_MESSAGES_TABLE,
    CREATE_MESSAGES_UNREAD_INDEX,
    CREATE_TUTORIALS_TABLE,
    CREATE_PHOTOS_TABLE,
];

/// Version 2: caregiving records.
pub const V2_STATEMENTS: &[&str] = &[
    CREATE_MEDICATIONS_TABLE,
    CREATE_DOSE_LOGS_TABLE,
    CREATE_TASKS_TABLE,
    CREATE_SHOPPING_ITEMS_TABLE,
];

/// Version 3: shared calendar.
pub const V3_STATEMENTS: &[&str] = &[
    CREATE_ROTATION_TABLE,
    CREATE_EVENTS_TABLE,
    CREATE_EVENTS_START_INDEX,
];
