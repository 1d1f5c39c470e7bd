pub const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS recipients (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      kind TEXT NOT NULL,
      aci TEXT,
      pni TEXT,
      phone_e164 TEXT,
      profile_given_name TEXT,
      profile_family_name TEXT,
      group_master_key BLOB,
      group_title TEXT,
      distribution_id TEXT,
      distribution_name TEXT
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_recipients_aci ON recipients(aci) WHERE aci IS NOT NULL;

    CREATE TABLE IF NOT EXISTS threads (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      recipient_id INTEGER NOT NULL REFERENCES recipients(id),
      archived INTEGER NOT NULL DEFAULT 0,
      pinned_order INTEGER,
      mute_until_ms INTEGER,
      expiration_timer_ms INTEGER,
      last_message_at INTEGER
    );

    CREATE TABLE IF NOT EXISTS messages (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      unique_id TEXT NOT NULL UNIQUE,
      thread_id INTEGER NOT NULL REFERENCES threads(id),
      direction_json TEXT NOT NULL,
      is_outgoing INTEGER NOT NULL DEFAULT 0,
      sender_id INTEGER,
      sent_at INTEGER NOT NULL,
      body TEXT,
      body_ranges_json TEXT,
      quote_json TEXT,
      link_preview_json TEXT,
      contact_share_json TEXT,
      sticker_json TEXT,
      gift_badge_json TEXT,
      payment_json TEXT,
      is_archived_payment INTEGER NOT NULL DEFAULT 0,
      was_remotely_deleted INTEGER NOT NULL DEFAULT 0,
      is_view_once INTEGER NOT NULL DEFAULT 0,
      expire_started_at INTEGER,
      expires_in_ms INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_messages_thread_sent ON messages(thread_id, sent_at, id);

    CREATE TABLE IF NOT EXISTS reactions (
      message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
      reactor_id INTEGER NOT NULL,
      emoji TEXT NOT NULL,
      reacted_at INTEGER NOT NULL,
      sort_order INTEGER NOT NULL,
      PRIMARY KEY (message_id, reactor_id)
    );

    CREATE TABLE IF NOT EXISTS attachments (
      id TEXT PRIMARY KEY,
      message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
      role TEXT NOT NULL,
      position INTEGER NOT NULL DEFAULT 0,
      mime TEXT,
      original_filename TEXT,
      caption TEXT,
      width INTEGER,
      height INTEGER,
      size_bytes INTEGER,
      blur_hash TEXT,
      plaintext_hash BLOB,
      encryption_key BLOB,
      flag TEXT NOT NULL DEFAULT 'none',
      client_uuid TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_attachments_message_role ON attachments(message_id, role, position);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payment_models (
      mc_receipt_data BLOB PRIMARY KEY,
      amount_pico_mob INTEGER NOT NULL,
      fee_pico_mob INTEGER,
      memo TEXT,
      status TEXT NOT NULL,
      failure TEXT,
      created_at INTEGER NOT NULL,
      block_index INTEGER,
      block_timestamp INTEGER,
      transaction_blob BLOB,
      public_keys_json TEXT NOT NULL DEFAULT '[]',
      key_images_json TEXT NOT NULL DEFAULT '[]'
    );

    CREATE TABLE IF NOT EXISTS archived_payments (
      message_id INTEGER PRIMARY KEY REFERENCES messages(id) ON DELETE CASCADE,
      amount TEXT,
      fee TEXT,
      note TEXT,
      direction TEXT NOT NULL,
      counterparty_aci TEXT,
      status TEXT NOT NULL,
      failure TEXT,
      timestamp INTEGER,
      block_index INTEGER,
      block_timestamp INTEGER,
      transaction_blob BLOB,
      receipt BLOB,
      public_keys_json TEXT NOT NULL DEFAULT '[]',
      key_images_json TEXT NOT NULL DEFAULT '[]'
    );
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS trg_messages_thread_activity
    AFTER INSERT ON messages
    FOR EACH ROW
    BEGIN
      UPDATE threads
      SET last_message_at = MAX(COALESCE(last_message_at, 0), NEW.sent_at)
      WHERE id = NEW.thread_id;
    END;
    "#,
];
