//! sqlite-adapter — SQLite implementation of the member and club repository
//! ports.
//!
//! Purpose
//! - Provide a lightweight, file-based store to run the registry locally
//!   without an external database server.
//! - Implements `MemberRepository` and `ClubRepository` from the `domain`
//!   crate over two entity tables and one junction table.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Dates are stored as ISO `YYYY-MM-DD` text through rusqlite's chrono
//!   support.
//! - Links cascade on delete, so removing a member or club detaches it from
//!   the other side.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use domain::{
    Club, ClubId, ClubRepository, ClubWithMembers, CoreError, Member, MemberId,
    MemberRepository, MemberWithClubs, NewClub, NewMember,
};
use rusqlite::{params, Connection, OptionalExtension};

const MEMBER_COLUMNS: &str = "m.id, m.name, m.email, m.birth_date";
const CLUB_COLUMNS: &str = "c.id, c.name, c.founded_on, c.image, c.description";

/// SQLite-backed repository for local development.
pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        Self::with_connection(conn)
    }

    /// Fresh private in-memory database; handy for tests.
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, CoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            birth_date TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS clubs (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            founded_on TEXT NOT NULL,
            image TEXT NOT NULL,
            description TEXT NOT NULL CHECK (length(description) <= 100)
        );
        CREATE TABLE IF NOT EXISTS club_members (
            club_id TEXT NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
            member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            PRIMARY KEY (club_id, member_id)
        );
        CREATE INDEX IF NOT EXISTS idx_club_members_member ON club_members(member_id);
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn row_to_member(row: &rusqlite::Row) -> rusqlite::Result<Member> {
    let id: String = row.get(0)?;
    let birth_date: NaiveDate = row.get(3)?;
    Ok(Member {
        id: MemberId::new(id),
        name: row.get(1)?,
        email: row.get(2)?,
        birth_date,
    })
}

fn row_to_club(row: &rusqlite::Row) -> rusqlite::Result<Club> {
    let id: String = row.get(0)?;
    let founded_on: NaiveDate = row.get(2)?;
    Ok(Club {
        id: ClubId::new(id),
        name: row.get(1)?,
        founded_on,
        image: row.get(3)?,
        description: row.get(4)?,
    })
}

fn clubs_of_member(conn: &Connection, member_id: &MemberId) -> Result<Vec<Club>, CoreError> {
    let sql = format!(
        "SELECT {CLUB_COLUMNS} FROM clubs c JOIN club_members cm ON cm.club_id = c.id WHERE cm.member_id = ?1 ORDER BY c.name, c.id"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
    let rows = stmt
        .query_map(params![member_id.as_str()], row_to_club)
        .map_err(map_sqerr)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sqerr)
}

fn members_of_club(conn: &Connection, club_id: &ClubId) -> Result<Vec<Member>, CoreError> {
    let sql = format!(
        "SELECT {MEMBER_COLUMNS} FROM members m JOIN club_members cm ON cm.member_id = m.id WHERE cm.club_id = ?1 ORDER BY m.name, m.id"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
    let rows = stmt
        .query_map(params![club_id.as_str()], row_to_member)
        .map_err(map_sqerr)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sqerr)
}

fn member_exists(conn: &Connection, id: &MemberId) -> Result<bool, CoreError> {
    conn.query_row(
        "SELECT 1 FROM members WHERE id = ?1",
        params![id.as_str()],
        |_| Ok(()),
    )
    .optional()
    .map(|r| r.is_some())
    .map_err(map_sqerr)
}

fn club_exists(conn: &Connection, id: &ClubId) -> Result<bool, CoreError> {
    conn.query_row(
        "SELECT 1 FROM clubs WHERE id = ?1",
        params![id.as_str()],
        |_| Ok(()),
    )
    .optional()
    .map(|r| r.is_some())
    .map_err(map_sqerr)
}

// ============ MemberRepository ============

impl MemberRepository for SqliteRepo {
    fn find_all(&self) -> Result<Vec<MemberWithClubs>, CoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members m ORDER BY m.name, m.id");
        let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
        let members = stmt
            .query_map([], row_to_member)
            .map_err(map_sqerr)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqerr)?;
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let clubs = clubs_of_member(&conn, &member.id)?;
            out.push(MemberWithClubs { member, clubs });
        }
        Ok(out)
    }

    fn find_by_id(&self, id: &MemberId) -> Result<Option<MemberWithClubs>, CoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members m WHERE m.id = ?1");
        let member = conn
            .query_row(&sql, params![id.as_str()], row_to_member)
            .optional()
            .map_err(map_sqerr)?;
        match member {
            Some(member) => {
                let clubs = clubs_of_member(&conn, &member.id)?;
                Ok(Some(MemberWithClubs { member, clubs }))
            }
            None => Ok(None),
        }
    }

    fn insert(&self, member: NewMember) -> Result<Member, CoreError> {
        let conn = self.lock()?;
        let stored = Member::new(MemberId::generate(), member);
        conn.execute(
            "INSERT INTO members(id, name, email, birth_date) VALUES (?1, ?2, ?3, ?4)",
            params![
                stored.id.as_str(),
                stored.name,
                stored.email,
                stored.birth_date
            ],
        )
        .map_err(map_sqerr)?;
        Ok(stored)
    }

    fn update(&self, member: &Member) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE members SET name = ?1, email = ?2, birth_date = ?3 WHERE id = ?4",
                params![
                    member.name,
                    member.email,
                    member.birth_date,
                    member.id.as_str()
                ],
            )
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::MemberNotFound)
        } else {
            Ok(())
        }
    }

    fn remove(&self, id: &MemberId) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM members WHERE id = ?1", params![id.as_str()])
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::MemberNotFound)
        } else {
            Ok(())
        }
    }
}

// ============ ClubRepository ============

impl ClubRepository for SqliteRepo {
    fn find_all(&self) -> Result<Vec<ClubWithMembers>, CoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {CLUB_COLUMNS} FROM clubs c ORDER BY c.name, c.id");
        let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
        let clubs = stmt
            .query_map([], row_to_club)
            .map_err(map_sqerr)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqerr)?;
        let mut out = Vec::with_capacity(clubs.len());
        for club in clubs {
            let members = members_of_club(&conn, &club.id)?;
            out.push(ClubWithMembers { club, members });
        }
        Ok(out)
    }

    fn find_by_id(&self, id: &ClubId) -> Result<Option<ClubWithMembers>, CoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {CLUB_COLUMNS} FROM clubs c WHERE c.id = ?1");
        let club = conn
            .query_row(&sql, params![id.as_str()], row_to_club)
            .optional()
            .map_err(map_sqerr)?;
        match club {
            Some(club) => {
                let members = members_of_club(&conn, &club.id)?;
                Ok(Some(ClubWithMembers { club, members }))
            }
            None => Ok(None),
        }
    }

    fn insert(&self, club: NewClub) -> Result<Club, CoreError> {
        let conn = self.lock()?;
        let stored = Club::new(ClubId::generate(), club);
        conn.execute(
            "INSERT INTO clubs(id, name, founded_on, image, description) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stored.id.as_str(),
                stored.name,
                stored.founded_on,
                stored.image,
                stored.description
            ],
        )
        .map_err(map_sqerr)?;
        Ok(stored)
    }

    fn update(&self, club: &Club) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE clubs SET name = ?1, founded_on = ?2, image = ?3, description = ?4 WHERE id = ?5",
                params![
                    club.name,
                    club.founded_on,
                    club.image,
                    club.description,
                    club.id.as_str()
                ],
            )
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::ClubNotFound)
        } else {
            Ok(())
        }
    }

    fn remove(&self, id: &ClubId) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM clubs WHERE id = ?1", params![id.as_str()])
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::ClubNotFound)
        } else {
            Ok(())
        }
    }

    fn link_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        let conn = self.lock()?;
        if !club_exists(&conn, club_id)? {
            return Err(CoreError::ClubNotFound);
        }
        if !member_exists(&conn, member_id)? {
            return Err(CoreError::MemberNotFound);
        }
        conn.execute(
            "INSERT OR IGNORE INTO club_members(club_id, member_id) VALUES (?1, ?2)",
            params![club_id.as_str(), member_id.as_str()],
        )
        .map_err(map_sqerr)?;
        Ok(())
    }

    fn unlink_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "DELETE FROM club_members WHERE club_id = ?1 AND member_id = ?2",
                params![club_id.as_str(), member_id.as_str()],
            )
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::NotRelated)
        } else {
            Ok(())
        }
    }

    fn replace_members(&self, club_id: &ClubId, member_ids: &[MemberId]) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        if !club_exists(&tx, club_id)? {
            return Err(CoreError::ClubNotFound);
        }
        for member_id in member_ids {
            if !member_exists(&tx, member_id)? {
                return Err(CoreError::MembersNotFound);
            }
        }
        tx.execute(
            "DELETE FROM club_members WHERE club_id = ?1",
            params![club_id.as_str()],
        )
        .map_err(map_sqerr)?;
        for member_id in member_ids {
            tx.execute(
                "INSERT OR IGNORE INTO club_members(club_id, member_id) VALUES (?1, ?2)",
                params![club_id.as_str(), member_id.as_str()],
            )
            .map_err(map_sqerr)?;
        }
        tx.commit().map_err(map_sqerr)?;
        Ok(())
    }
}
