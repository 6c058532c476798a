use std::fmt;

#[derive(Debug)]
pub enum KakaoTalkError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
    Catalog,
}

impl std::error::Error for KakaoTalkError {}

impl fmt::Display for KakaoTalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KakaoTalkError::ArtifactAbsent => write!(f, "KakaoTalk Message.sqlite not found in backup"),
            KakaoTalkError::SqliteParse => write!(f, "Failed to open KakaoTalk database"),
            KakaoTalkError::BadSQL => write!(f, "Failed to compose KakaoTalk SQL query"),
            KakaoTalkError::SchemaDrift => write!(f, "KakaoTalk Message table is missing"),
            KakaoTalkError::Catalog => write!(f, "Failed to query backup catalog for KakaoTalk"),
        }
    }
}
