#[cfg(test)]
use std::collections::VecDeque;
use std::fmt::{self, Display};

use bytes::Bytes;
use reqwest::Response;

/// The body could not be read to the end.
#[derive(Debug, PartialEq, Eq)]
pub struct Error(String);

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection lost while streaming: {}", self.0)
    }
}

/// The body of a streamed response, chunk by chunk.
pub enum Chunks {
    Response { response: Response, received: usize },
    #[cfg(test)]
    Queue(VecDeque<Bytes>),
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Chunks::Response {
            response,
            received: 0,
        }
    }

    #[cfg(test)]
    pub fn from_vec_deque(queue: VecDeque<Bytes>) -> Self {
        Chunks::Queue(queue)
    }

    /// Returns the next chunk, or `None` once the body is complete.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response { response, received } => {
                match response.chunk().await {
                    Ok(Some(chunk)) => {
                        *received += chunk.len();
                        trace!("got {} bytes ({received} total)", chunk.len());
                        Ok(Some(chunk))
                    }
                    Ok(None) => {
                        debug!("response body finished after {received} bytes");
                        Ok(None)
                    }
                    Err(err) => Err(Error(err.to_string())),
                }
            }
            #[cfg(test)]
            Chunks::Queue(queue) => Ok(queue.pop_front()),
        }
    }
}
