use banter_domain::{Conversation, ConversationId, Message, UserId};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Text, Timestamp};

use super::db_service::DBService;
use super::Service;
use crate::schema::conversations;
use crate::{Error, Result};

#[derive(Debug, Insertable, Queryable, QueryableByName)]
#[diesel(table_name = conversations)]
struct RawConversation {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = Text)]
    user_id: String,
    #[diesel(sql_type = Timestamp)]
    created_at: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    updated_at: NaiveDateTime,
    #[diesel(sql_type = Text)]
    messages: String,
}

impl RawConversation {
    fn build(user: &UserId, conversation: &Conversation) -> Result<Self> {
        Ok(Self {
            id: conversation.id.to_string(),
            user_id: user.as_str().to_string(),
            created_at: conversation.created_at.naive_utc(),
            updated_at: conversation.updated_at.naive_utc(),
            messages: serde_json::to_string(&conversation.messages)?,
        })
    }
}

impl TryFrom<RawConversation> for Conversation {
    type Error = crate::error::Error;

    fn try_from(raw: RawConversation) -> Result<Self> {
        Ok(Conversation {
            id: ConversationId::parse(&raw.id)?,
            messages: serde_json::from_str(&raw.messages)?,
            created_at: DateTime::from_naive_utc_and_offset(raw.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(raw.updated_at, Utc),
        })
    }
}

/// The conversation store, partitioned by user identifier. Append-only from
/// this component's perspective; rows are never deleted.
#[async_trait::async_trait]
pub trait ConversationService: Send + Sync {
    async fn create(&self, user: &UserId) -> Result<Conversation>;
    async fn append(
        &self,
        user: &UserId,
        id: Option<ConversationId>,
        message: Message,
    ) -> Result<Conversation>;
    async fn get(&self, user: &UserId, id: ConversationId) -> Result<Conversation>;
    async fn list(&self, user: &UserId) -> Result<Vec<Conversation>>;
}

pub struct Live<P: DBService> {
    pool_service: P,
}

impl<P: DBService> Live<P> {
    pub fn new(pool_service: P) -> Self {
        Self { pool_service }
    }

    async fn find(
        &self,
        user: &UserId,
        id: ConversationId,
    ) -> Result<Option<Conversation>> {
        let pool = self.pool_service.pool().await?;
        let mut conn = pool.get()?;

        let raw: Option<RawConversation> = conversations::table
            .filter(conversations::id.eq(id.to_string()))
            .filter(conversations::user_id.eq(user.as_str()))
            .first(&mut conn)
            .optional()?;

        raw.map(Conversation::try_from).transpose()
    }
}

#[async_trait::async_trait]
impl<P: DBService + Send + Sync> ConversationService for Live<P> {
    async fn create(&self, user: &UserId) -> Result<Conversation> {
        let pool = self.pool_service.pool().await?;
        let mut conn = pool.get()?;

        let conversation = Conversation::new();
        let raw = RawConversation::build(user, &conversation)?;

        diesel::insert_into(conversations::table)
            .values(&raw)
            .execute(&mut conn)?;

        Ok(conversation)
    }

    async fn append(
        &self,
        user: &UserId,
        id: Option<ConversationId>,
        message: Message,
    ) -> Result<Conversation> {
        let id = id.unwrap_or_else(ConversationId::generate);

        // Unknown ids fall through to an insert: the first append creates
        // the conversation with an empty prior message list.
        let conversation = match self.find(user, id).await? {
            Some(conversation) => conversation,
            None => Conversation::new().id(id),
        }
        .append(message);

        let raw = RawConversation::build(user, &conversation)?;

        let pool = self.pool_service.pool().await?;
        let mut conn = pool.get()?;

        diesel::insert_into(conversations::table)
            .values(&raw)
            .on_conflict(conversations::id)
            .do_update()
            .set((
                conversations::messages.eq(&raw.messages),
                conversations::updated_at.eq(&raw.updated_at),
            ))
            .execute(&mut conn)?;

        Ok(conversation)
    }

    async fn get(&self, user: &UserId, id: ConversationId) -> Result<Conversation> {
        self.find(user, id)
            .await?
            .ok_or(Error::ConversationNotFound(id))
    }

    async fn list(&self, user: &UserId) -> Result<Vec<Conversation>> {
        let pool = self.pool_service.pool().await?;
        let mut conn = pool.get()?;

        let raw: Vec<RawConversation> = conversations::table
            .filter(conversations::user_id.eq(user.as_str()))
            .order(conversations::updated_at.desc())
            .load(&mut conn)?;

        raw.into_iter().map(Conversation::try_from).collect()
    }
}

impl Service {
    pub fn storage_service(database_path: &str) -> Result<impl ConversationService> {
        let pool_service = Service::db_pool_service(database_path)?;
        Ok(Live::new(pool_service))
    }
}
