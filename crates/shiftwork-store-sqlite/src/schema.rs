//! SQL schema for the shiftwork SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// Dates are `YYYY-MM-DD`, times `HH:MM:SS` and local datetimes
/// `YYYY-MM-DDTHH:MM:SS`, so lexical order equals chronological order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL DEFAULT '',
    name_key    TEXT NOT NULL,   -- lowercased, whitespace-collapsed full name
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    UNIQUE (tenant_id, name_key)
);

CREATE TABLE IF NOT EXISTS clients (
    client_id  TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL,
    name       TEXT NOT NULL,
    name_key   TEXT NOT NULL,
    deleted    INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
    location_id TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    name        TEXT NOT NULL,
    name_key    TEXT NOT NULL,
    address     TEXT,
    deleted     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- Live names are unique per tenant; a soft-deleted name may be reused.
CREATE UNIQUE INDEX IF NOT EXISTS clients_name_idx
    ON clients(tenant_id, name_key) WHERE deleted = 0;
CREATE UNIQUE INDEX IF NOT EXISTS locations_name_idx
    ON locations(tenant_id, name_key) WHERE deleted = 0;

CREATE TABLE IF NOT EXISTS shifts (
    shift_id    TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    title       TEXT NOT NULL,
    date        TEXT NOT NULL,
    start_time  TEXT,            -- NULL = all day
    end_time    TEXT,
    client_id   TEXT REFERENCES clients(client_id),
    location_id TEXT REFERENCES locations(location_id),
    slots       INTEGER NOT NULL DEFAULT 1,
    claimable   INTEGER NOT NULL DEFAULT 0,
    status      TEXT NOT NULL DEFAULT 'draft',
    shift_code  TEXT,
    notes       TEXT,
    import_tag  TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL,
    shift_id      TEXT NOT NULL REFERENCES shifts(shift_id) ON DELETE CASCADE,
    employee_id   TEXT NOT NULL REFERENCES employees(employee_id),
    status        TEXT NOT NULL DEFAULT 'pending',
    import_tag    TEXT,
    created_at    TEXT NOT NULL,
    UNIQUE (shift_id, employee_id)
);

CREATE TABLE IF NOT EXISTS time_entries (
    entry_id      TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL,
    employee_id   TEXT NOT NULL REFERENCES employees(employee_id),
    shift_id      TEXT REFERENCES shifts(shift_id) ON DELETE SET NULL,
    client_id     TEXT REFERENCES clients(client_id),
    clock_in      TEXT NOT NULL,
    clock_out     TEXT,            -- NULL while clocked in
    break_minutes INTEGER NOT NULL DEFAULT 0,
    status        TEXT NOT NULL DEFAULT 'pending',
    notes         TEXT,
    import_tag    TEXT,
    created_at    TEXT NOT NULL,
    UNIQUE (employee_id, clock_in)
);

-- At most one open session per employee.
CREATE UNIQUE INDEX IF NOT EXISTS time_entries_open_idx
    ON time_entries(employee_id) WHERE clock_out IS NULL;

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id   TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    shift_id    TEXT NOT NULL REFERENCES shifts(shift_id) ON DELETE CASCADE,
    employee_id TEXT NOT NULL REFERENCES employees(employee_id),
    kind        TEXT NOT NULL,   -- 'missing_attendance' | 'unassigned_attendance'
    description TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'new',
    created_at  TEXT NOT NULL,
    UNIQUE (shift_id, employee_id, kind)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL,
    recipient_id    TEXT NOT NULL,
    recipient_type  TEXT NOT NULL,
    kind            TEXT NOT NULL,
    title           TEXT NOT NULL,
    body            TEXT NOT NULL,
    metadata        TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS shifts_date_idx          ON shifts(tenant_id, date);
CREATE INDEX IF NOT EXISTS shifts_code_idx          ON shifts(tenant_id, shift_code, date);
CREATE INDEX IF NOT EXISTS shifts_tag_idx           ON shifts(import_tag);
CREATE INDEX IF NOT EXISTS assignments_employee_idx ON assignments(employee_id);
CREATE INDEX IF NOT EXISTS entries_employee_idx     ON time_entries(employee_id, clock_in);
CREATE INDEX IF NOT EXISTS entries_shift_idx        ON time_entries(shift_id);
CREATE INDEX IF NOT EXISTS notifications_recipient_idx
    ON notifications(tenant_id, recipient_id, created_at);

PRAGMA user_version = 1;
";
