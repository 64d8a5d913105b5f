use redb::TableDefinition;

/// Image records: uuid -> ImageRecord (msgpack)
pub const IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("images");

/// Stored-file-name index: name -> image uuid (for /images/:name lookups)
pub const IMAGE_NAMES: TableDefinition<&str, &str> = TableDefinition::new("image_names");

/// Emote records: uuid -> EmoteRecord (msgpack)
pub const EMOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("emotes");

/// Flair feature records: uuid -> FeatureRecord (msgpack)
pub const FEATURES: TableDefinition<&str, &[u8]> = TableDefinition::new("features");

/// User records: uuid -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Username index: username -> user uuid
pub const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Subscription records: uuid -> SubscriptionRecord (msgpack)
pub const SUBSCRIPTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("subscriptions");

/// User subscription index: user uuid -> msgpack Vec of subscription UUIDs
pub const USER_SUBSCRIPTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("user_subscriptions");
