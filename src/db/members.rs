//! Tenant member lookup table, fed by the membership subsystem.

use super::Database;
use crate::types::Member;
use anyhow::Result;
use rusqlite::{Connection, params};

pub(crate) fn list_members_internal(conn: &Connection, tenant_id: &str) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, avatar_url FROM members WHERE tenant_id = ?1 ORDER BY name, id",
    )?;
    let members = stmt
        .query_map(params![tenant_id], |row| {
            Ok(Member {
                id: row.get(0)?,
                name: row.get(1)?,
                avatar_url: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}

impl Database {
    pub fn upsert_member(&self, tenant_id: &str, member: &Member) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO members (tenant_id, id, name, avatar_url) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(tenant_id, id) DO UPDATE SET
                    name = excluded.name,
                    avatar_url = excluded.avatar_url",
                params![tenant_id, &member.id, &member.name, &member.avatar_url],
            )?;
            Ok(())
        })
    }

    pub fn list_members(&self, tenant_id: &str) -> Result<Vec<Member>> {
        self.with_conn(|conn| list_members_internal(conn, tenant_id))
    }

    /// Remove a member. PERSON values pointing at them are left alone.
    pub fn remove_member(&self, tenant_id: &str, member_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM members WHERE tenant_id = ?1 AND id = ?2",
                params![tenant_id, member_id],
            )?;
            Ok(deleted > 0)
        })
    }
}
