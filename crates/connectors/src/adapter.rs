use crate::{
    error::ConnectorError,
    file::FileConnector,
    relational::RelationalConnector,
    request::{FetchRequest, ResultHandle},
    web::WebApiConnector,
};

/// A connected data source of any class. Prepared fetches all yield the
/// same handle shape, so the engine is connector-agnostic past this point.
pub enum Connector {
    Relational(RelationalConnector),
    File(FileConnector),
    WebApi(WebApiConnector),
}

impl Connector {
    pub async fn prepare(&self, request: &FetchRequest) -> Result<ResultHandle, ConnectorError> {
        match self {
            Connector::Relational(c) => c.prepare(request).await,
            Connector::File(c) => c.prepare(request).await,
            Connector::WebApi(c) => c.prepare(request).await,
        }
    }
}
