// Transcripts repository for Transcript Editor
// Handles CRUD operations for transcript segments and their conversation groupings

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use super::models::{ConversationKey, ConversationSummary, NewTranscriptSegment, TranscriptSegment};
use super::DatabaseManager;

const SEGMENT_COLUMNS: &str =
    "id, session_id, conversation, speaker, date, start_time, end_time, duration, content";

impl DatabaseManager {
    /// Insert new segments in one transaction, returning them with their assigned ids
    pub fn insert_transcript_segments(&self, segments: &[NewTranscriptSegment]) -> Result<Vec<TranscriptSegment>> {
        self.with_connection(|conn| {
            insert_transcript_segments_impl(conn, segments)
        })
    }

    /// Get a single segment by id
    pub fn get_transcript_segment(&self, id: i64) -> Result<Option<TranscriptSegment>> {
        self.with_connection(|conn| {
            get_transcript_segment_impl(conn, id)
        })
    }

    /// Get every segment of the conversation that holds the highest id
    pub fn get_latest_conversation(&self) -> Result<Option<Vec<TranscriptSegment>>> {
        self.with_connection(|conn| {
            get_latest_conversation_impl(conn)
        })
    }

    /// Get every segment of the conversation at a 1-based position
    pub fn get_conversation_at(&self, index: i64) -> Result<Option<Vec<TranscriptSegment>>> {
        self.with_connection(|conn| {
            get_conversation_at_impl(conn, index)
        })
    }

    /// Get all segments for one grouping key, ordered by start time
    pub fn get_conversation_segments(&self, key: &ConversationKey) -> Result<Vec<TranscriptSegment>> {
        self.with_connection(|conn| {
            get_conversation_segments_impl(conn, key)
        })
    }

    /// Get the distinct grouping keys in conversation order
    pub fn get_conversation_keys(&self) -> Result<Vec<ConversationKey>> {
        self.with_connection(|conn| {
            get_conversation_keys_impl(conn)
        })
    }

    /// Get a summary row per conversation in conversation order
    pub fn get_conversation_summaries(&self) -> Result<Vec<ConversationSummary>> {
        self.with_connection(|conn| {
            get_conversation_summaries_impl(conn)
        })
    }

    /// Overwrite every mutable field of a segment. Returns None if the id is absent
    pub fn update_transcript_segment(&self, segment: &TranscriptSegment) -> Result<Option<TranscriptSegment>> {
        self.with_connection(|conn| {
            update_transcript_segment_impl(conn, segment)
        })
    }

    /// Rename one speaker within a conversation
    pub fn rename_speaker_in_conversation(
        &self,
        key: &ConversationKey,
        current_name: &str,
        new_name: &str,
    ) -> Result<Vec<TranscriptSegment>> {
        self.with_connection(|conn| {
            rename_speaker_in_conversation_impl(conn, key, current_name, new_name)
        })
    }

    /// Set the speaker of every listed segment
    pub fn rename_speaker_for_ids(&self, new_name: &str, ids: &[i64]) -> Result<Vec<TranscriptSegment>> {
        self.with_connection(|conn| {
            rename_speaker_for_ids_impl(conn, new_name, ids)
        })
    }

    /// Delete segments by id, returning the deleted rows
    pub fn delete_transcript_segments(&self, ids: &[i64]) -> Result<Vec<TranscriptSegment>> {
        self.with_connection(|conn| {
            delete_transcript_segments_impl(conn, ids)
        })
    }

    /// Delete a whole conversation, returning the number of rows removed
    pub fn delete_conversation(&self, key: &ConversationKey) -> Result<usize> {
        self.with_connection(|conn| {
            delete_conversation_impl(conn, key)
        })
    }
}

fn segment_from_row(row: &Row<'_>) -> rusqlite::Result<TranscriptSegment> {
    Ok(TranscriptSegment {
        id: row.get(0)?,
        session_id: row.get(1)?,
        conversation: row.get(2)?,
        speaker: row.get(3)?,
        date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        duration: row.get(7)?,
        content: row.get(8)?,
    })
}

/// Ids bound as one JSON array parameter, expanded with `json_each` in SQL
fn id_list(ids: &[i64]) -> Result<String> {
    serde_json::to_string(ids).context("Failed to encode id list")
}

fn sorted_by_id(mut segments: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    segments.sort_by_key(|s| s.id);
    segments
}

fn insert_transcript_segments_impl(conn: &Connection, segments: &[NewTranscriptSegment]) -> Result<Vec<TranscriptSegment>> {
    let tx = conn.unchecked_transaction()
        .context("Failed to start transaction")?;

    let mut inserted = Vec::with_capacity(segments.len());
    {
        let mut stmt = tx.prepare(&format!(
            r#"
            INSERT INTO transcripts (
                session_id, conversation, speaker, date,
                start_time, end_time, duration, content
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {SEGMENT_COLUMNS}
            "#
        )).context("Failed to prepare transcript insert")?;

        for segment in segments {
            let row = stmt.query_row(
                params![
                    segment.session_id,
                    segment.conversation,
                    segment.speaker,
                    segment.date,
                    segment.start_time,
                    segment.end_time,
                    segment.duration,
                    segment.content,
                ],
                segment_from_row,
            ).context("Failed to insert transcript segment")?;
            inserted.push(row);
        }
    }

    tx.commit().context("Failed to commit transcript batch")?;
    Ok(inserted)
}

fn get_transcript_segment_impl(conn: &Connection, id: i64) -> Result<Option<TranscriptSegment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SEGMENT_COLUMNS} FROM transcripts WHERE id = ?1"
    )).context("Failed to prepare get_transcript_segment query")?;

    let mut rows = stmt.query_map(params![id], segment_from_row)
        .context("Failed to query transcript segment")?;

    rows.next()
        .transpose()
        .context("Failed to read transcript segment")
}

fn get_conversation_segments_impl(conn: &Connection, key: &ConversationKey) -> Result<Vec<TranscriptSegment>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {SEGMENT_COLUMNS}
        FROM transcripts
        WHERE session_id = ?1 AND conversation = ?2
        ORDER BY start_time ASC, id ASC
        "#
    )).context("Failed to prepare get_conversation_segments query")?;

    let segments = stmt.query_map(params![key.session_id, key.conversation], segment_from_row)
        .context("Failed to query conversation segments")?;

    segments.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect conversation segments")
}

fn get_latest_conversation_impl(conn: &Connection) -> Result<Option<Vec<TranscriptSegment>>> {
    let mut stmt = conn.prepare(
        "SELECT session_id, conversation FROM transcripts ORDER BY id DESC LIMIT 1"
    ).context("Failed to prepare latest conversation query")?;

    let mut keys = stmt.query_map([], |row| {
        Ok(ConversationKey {
            session_id: row.get(0)?,
            conversation: row.get(1)?,
        })
    }).context("Failed to query latest conversation")?;

    match keys.next().transpose().context("Failed to read latest conversation")? {
        Some(key) => Ok(Some(get_conversation_segments_impl(conn, &key)?)),
        None => Ok(None),
    }
}

fn get_conversation_at_impl(conn: &Connection, index: i64) -> Result<Option<Vec<TranscriptSegment>>> {
    if index < 1 {
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        r#"
        SELECT session_id, conversation
        FROM transcripts
        GROUP BY session_id, conversation
        ORDER BY MIN(id) ASC
        LIMIT 1 OFFSET ?1
        "#
    ).context("Failed to prepare conversation index query")?;

    let mut keys = stmt.query_map(params![index - 1], |row| {
        Ok(ConversationKey {
            session_id: row.get(0)?,
            conversation: row.get(1)?,
        })
    }).context("Failed to query conversation at index")?;

    match keys.next().transpose().context("Failed to read conversation at index")? {
        Some(key) => Ok(Some(get_conversation_segments_impl(conn, &key)?)),
        None => Ok(None),
    }
}

fn get_conversation_keys_impl(conn: &Connection) -> Result<Vec<ConversationKey>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT session_id, conversation
        FROM transcripts
        GROUP BY session_id, conversation
        ORDER BY MIN(id) ASC
        "#
    ).context("Failed to prepare conversation keys query")?;

    let keys = stmt.query_map([], |row| {
        Ok(ConversationKey {
            session_id: row.get(0)?,
            conversation: row.get(1)?,
        })
    }).context("Failed to query conversation keys")?;

    keys.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect conversation keys")
}

fn get_conversation_summaries_impl(conn: &Connection) -> Result<Vec<ConversationSummary>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT session_id, conversation, COUNT(*), MIN(date)
        FROM transcripts
        GROUP BY session_id, conversation
        ORDER BY MIN(id) ASC
        "#
    ).context("Failed to prepare conversation summaries query")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            ConversationKey {
                session_id: row.get(0)?,
                conversation: row.get(1)?,
            },
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
        ))
    }).context("Failed to query conversation summaries")?;

    let rows = rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect conversation summaries")?;

    Ok(rows
        .into_iter()
        .zip(1..)
        .map(|((key, segment_count, date), index)| ConversationSummary {
            index,
            key,
            segment_count,
            date,
        })
        .collect())
}

fn update_transcript_segment_impl(conn: &Connection, segment: &TranscriptSegment) -> Result<Option<TranscriptSegment>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        UPDATE transcripts SET
            session_id = ?2,
            conversation = ?3,
            speaker = ?4,
            date = ?5,
            start_time = ?6,
            end_time = ?7,
            duration = ?8,
            content = ?9
        WHERE id = ?1
        RETURNING {SEGMENT_COLUMNS}
        "#
    )).context("Failed to prepare transcript update")?;

    let mut rows = stmt.query_map(
        params![
            segment.id,
            segment.session_id,
            segment.conversation,
            segment.speaker,
            segment.date,
            segment.start_time,
            segment.end_time,
            segment.duration,
            segment.content,
        ],
        segment_from_row,
    ).context("Failed to update transcript segment")?;

    rows.next()
        .transpose()
        .context("Failed to read updated transcript segment")
}

fn rename_speaker_in_conversation_impl(
    conn: &Connection,
    key: &ConversationKey,
    current_name: &str,
    new_name: &str,
) -> Result<Vec<TranscriptSegment>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        UPDATE transcripts SET speaker = ?1
        WHERE session_id = ?2 AND conversation = ?3 AND speaker = ?4
        RETURNING {SEGMENT_COLUMNS}
        "#
    )).context("Failed to prepare speaker rename")?;

    let rows = stmt.query_map(
        params![new_name, key.session_id, key.conversation, current_name],
        segment_from_row,
    ).context("Failed to rename speaker")?;

    let renamed = rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect renamed segments")?;
    Ok(sorted_by_id(renamed))
}

fn rename_speaker_for_ids_impl(conn: &Connection, new_name: &str, ids: &[i64]) -> Result<Vec<TranscriptSegment>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!(
        r#"
        UPDATE transcripts SET speaker = ?1
        WHERE id IN (SELECT value FROM json_each(?2))
        RETURNING {SEGMENT_COLUMNS}
        "#
    )).context("Failed to prepare speaker rename by ids")?;

    let rows = stmt.query_map(params![new_name, id_list(ids)?], segment_from_row)
        .context("Failed to rename speaker by ids")?;

    let renamed = rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect renamed segments")?;
    Ok(sorted_by_id(renamed))
}

fn delete_transcript_segments_impl(conn: &Connection, ids: &[i64]) -> Result<Vec<TranscriptSegment>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!(
        r#"
        DELETE FROM transcripts
        WHERE id IN (SELECT value FROM json_each(?1))
        RETURNING {SEGMENT_COLUMNS}
        "#
    )).context("Failed to prepare transcript delete")?;

    let rows = stmt.query_map(params![id_list(ids)?], segment_from_row)
        .context("Failed to delete transcript segments")?;

    let deleted = rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect deleted segments")?;
    Ok(sorted_by_id(deleted))
}

fn delete_conversation_impl(conn: &Connection, key: &ConversationKey) -> Result<usize> {
    let rows_deleted = conn.execute(
        "DELETE FROM transcripts WHERE session_id = ?1 AND conversation = ?2",
        params![key.session_id, key.conversation],
    ).context("Failed to delete conversation")?;

    Ok(rows_deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    const SESSION_A: &str = "7d0f4c4e-1b2a-4c55-9d0e-2f7a3b1c9e01";
    const SESSION_B: &str = "b3e1a2c4-5d6f-4a7b-8c9d-0e1f2a3b4c5d";

    fn create_test_db() -> (TempDir, DatabaseManager) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = DatabaseManager::new(db_path).unwrap();
        (dir, db)
    }

    fn segment(session: &str, conversation: i64, speaker: &str, start: &str, content: &str) -> NewTranscriptSegment {
        NewTranscriptSegment {
            session_id: session.to_string(),
            conversation,
            speaker: speaker.to_string(),
            date: "2024-05-01".to_string(),
            start_time: start.to_string(),
            end_time: start.to_string(),
            duration: "00:00:00.000".to_string(),
            content: content.to_string(),
        }
    }

    fn key(session: &str, conversation: i64) -> ConversationKey {
        ConversationKey {
            session_id: session.to_string(),
            conversation,
        }
    }

    #[test]
    fn test_insert_assigns_ids() {
        let (_dir, db) = create_test_db();

        let inserted = db.insert_transcript_segments(&[
            segment(SESSION_A, 1, "Alice", "00:00:01.000", "hi"),
            segment(SESSION_A, 1, "Bob", "00:00:02.000", "yo"),
        ]).unwrap();

        assert_eq!(inserted.len(), 2);
        assert!(inserted[0].id < inserted[1].id);
        assert_eq!(db.get_transcript_segment(inserted[1].id).unwrap(), Some(inserted[1].clone()));
        assert_eq!(db.get_transcript_segment(999).unwrap(), None);
    }

    #[test]
    fn test_conversation_segments_ordered_by_start_time() {
        let (_dir, db) = create_test_db();

        db.insert_transcript_segments(&[
            segment(SESSION_A, 1, "Bob", "00:00:05.000", "second"),
            segment(SESSION_A, 1, "Alice", "00:00:01.000", "first"),
            segment(SESSION_A, 2, "Carol", "00:00:00.500", "elsewhere"),
        ]).unwrap();

        let segments = db.get_conversation_segments(&key(SESSION_A, 1)).unwrap();
        let contents: Vec<&str> = segments.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_latest_conversation() {
        let (_dir, db) = create_test_db();
        assert_eq!(db.get_latest_conversation().unwrap(), None);

        db.insert_transcript_segments(&[
            segment(SESSION_A, 1, "Alice", "00:00:01.000", "old"),
            segment(SESSION_B, 3, "Bob", "00:00:02.000", "new-1"),
            segment(SESSION_B, 3, "Alice", "00:00:03.000", "new-2"),
        ]).unwrap();

        let latest = db.get_latest_conversation().unwrap().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().all(|s| s.key() == key(SESSION_B, 3)));
    }

    #[test]
    fn test_conversation_ordering_follows_first_insert() {
        let (_dir, db) = create_test_db();

        db.insert_transcript_segments(&[
            segment(SESSION_B, 2, "Alice", "00:00:01.000", "b2"),
            segment(SESSION_A, 1, "Bob", "00:00:01.000", "a1"),
            segment(SESSION_B, 2, "Alice", "00:00:02.000", "b2 again"),
        ]).unwrap();

        let keys = db.get_conversation_keys().unwrap();
        assert_eq!(keys, vec![key(SESSION_B, 2), key(SESSION_A, 1)]);

        let second = db.get_conversation_at(2).unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].content, "a1");

        assert_eq!(db.get_conversation_at(3).unwrap(), None);
        assert_eq!(db.get_conversation_at(0).unwrap(), None);

        let summaries = db.get_conversation_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].index, 1);
        assert_eq!(summaries[0].segment_count, 2);
        assert_eq!(summaries[1].key, key(SESSION_A, 1));
    }

    #[test]
    fn test_update_missing_segment_returns_none() {
        let (_dir, db) = create_test_db();

        let ghost = TranscriptSegment {
            id: 42,
            session_id: SESSION_A.to_string(),
            conversation: 1,
            speaker: "Nobody".to_string(),
            date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            duration: String::new(),
            content: String::new(),
        };
        assert_eq!(db.update_transcript_segment(&ghost).unwrap(), None);
    }

    #[test]
    fn test_rename_and_delete_by_ids() {
        let (_dir, db) = create_test_db();

        let inserted = db.insert_transcript_segments(&[
            segment(SESSION_A, 1, "Alice", "00:00:01.000", "one"),
            segment(SESSION_A, 1, "Bob", "00:00:02.000", "two"),
            segment(SESSION_B, 1, "Alice", "00:00:03.000", "three"),
        ]).unwrap();
        let ids: Vec<i64> = inserted.iter().map(|s| s.id).collect();

        let renamed = db.rename_speaker_for_ids("Carol", &[ids[2], ids[0]]).unwrap();
        assert_eq!(renamed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
        assert!(renamed.iter().all(|s| s.speaker == "Carol"));
        assert_eq!(db.get_transcript_segment(ids[1]).unwrap().unwrap().speaker, "Bob");

        let deleted = db.delete_transcript_segments(&[ids[1], 12345]).unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(db.get_transcript_segment(ids[1]).unwrap(), None);

        assert!(db.rename_speaker_for_ids("X", &[]).unwrap().is_empty());
        assert!(db.delete_transcript_segments(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_rename_in_conversation_and_delete_conversation() {
        let (_dir, db) = create_test_db();

        db.insert_transcript_segments(&[
            segment(SESSION_A, 1, "Alice", "00:00:01.000", "one"),
            segment(SESSION_A, 1, "Bob", "00:00:02.000", "two"),
            segment(SESSION_A, 2, "Alice", "00:00:03.000", "other conversation"),
        ]).unwrap();

        let renamed = db.rename_speaker_in_conversation(&key(SESSION_A, 1), "Alice", "Zed").unwrap();
        assert_eq!(renamed.len(), 1);

        let untouched = db.get_conversation_segments(&key(SESSION_A, 2)).unwrap();
        assert_eq!(untouched[0].speaker, "Alice");

        assert_eq!(db.delete_conversation(&key(SESSION_A, 1)).unwrap(), 2);
        assert_eq!(db.delete_conversation(&key(SESSION_A, 1)).unwrap(), 0);
        assert_eq!(db.get_conversation_keys().unwrap(), vec![key(SESSION_A, 2)]);
    }

    #[test]
    fn test_id_lists_beyond_sqlite_variable_limit() {
        let (_dir, db) = create_test_db();

        let inserted = db.insert_transcript_segments(&[
            segment(SESSION_A, 1, "Alice", "00:00:01.000", "one"),
            segment(SESSION_A, 1, "Bob", "00:00:02.000", "two"),
        ]).unwrap();

        let mut ids: Vec<i64> = (100_000..140_000).collect();
        ids.push(inserted[0].id);

        let renamed = db.rename_speaker_for_ids("Carol", &ids).unwrap();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].id, inserted[0].id);

        ids.push(inserted[1].id);
        let deleted = db.delete_transcript_segments(&ids).unwrap();
        assert_eq!(deleted.iter().map(|s| s.id).collect::<Vec<_>>(), vec![inserted[0].id, inserted[1].id]);
        assert_eq!(db.get_conversation_keys().unwrap(), Vec::new());
    }
}
