use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use parsekit_core::{ParseTypes, Value};
use tracing::Instrument;

use crate::busy::BusyFlag;
use crate::object::reply_object;
use crate::{ParseClient, ParseError};

/// A blob stored through the `files/` endpoint.
pub struct ParseFile {
    client: ParseClient,
    state: Mutex<FileState>,
    busy: BusyFlag,
}

#[derive(Clone, Debug, Default)]
struct FileState {
    name: Option<String>,
    data: Vec<u8>,
    dirty: bool,
    data_available: bool,
    url: Option<String>,
}

impl fmt::Debug for ParseFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ParseFile")
            .field("name", &state.name)
            .field("len", &state.data.len())
            .field("dirty", &state.dirty)
            .field("data_available", &state.data_available)
            .field("url", &state.url)
            .finish()
    }
}

impl ParseFile {
    pub fn new(client: ParseClient) -> Self {
        Self {
            client,
            state: Mutex::new(FileState::default()),
            busy: BusyFlag::default(),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.state().name.clone()
    }

    /// A file can be named once; the backend may still rename it on save.
    pub fn set_name(&self, name: impl Into<String>) -> Result<(), ParseError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ParseError::InvalidArgument(
                "file name cannot be empty".to_string(),
            ));
        }

        let mut state = self.state();
        if let Some(existing) = &state.name {
            tracing::warn!(existing = %existing, requested = %name, "file already has a name");
            return Err(ParseError::InvalidArgument(format!(
                "file is already named '{existing}'"
            )));
        }
        state.name = Some(name);
        Ok(())
    }

    pub fn data(&self) -> Vec<u8> {
        self.state().data.clone()
    }

    pub fn set_data(&self, data: impl Into<Vec<u8>>) {
        let data = data.into();
        let mut state = self.state();
        if state.data != data {
            state.data = data;
            state.dirty = true;
            state.data_available = true;
        }
    }

    pub fn set_data_from_file(&self, path: impl AsRef<Path>) -> Result<(), ParseError> {
        let data = std::fs::read(path)?;
        self.set_data(data);
        Ok(())
    }

    /// Local data differs from what was last saved or fetched.
    pub fn dirty(&self) -> bool {
        self.state().dirty
    }

    pub fn data_available(&self) -> bool {
        self.state().data_available
    }

    pub fn url(&self) -> Option<String> {
        self.state().url.clone()
    }

    pub fn busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Reference for storing this file in an object field; needs the
    /// `ParseTypes` tag hook on the client.
    pub fn to_pointer(&self) -> Option<Value> {
        let state = self.state();
        state
            .name
            .as_ref()
            .map(|name| ParseTypes::file(name.clone(), state.url.clone()))
    }

    pub async fn save(&self) -> Result<(), ParseError> {
        let _busy = self.busy.acquire("file")?;
        let (name, data) = {
            let state = self.state();
            (state.name.clone(), state.data.clone())
        };
        let name = name.ok_or_else(|| {
            ParseError::InvalidArgument("file needs a name before it can be saved".to_string())
        })?;

        let span = tracing::info_span!("parse_file_save", name = %name, len = data.len());
        let reply = self
            .client
            .post_bytes(&file_path(&name), guess_content_type(&name), data, 201)
            .instrument(span)
            .await?;
        let reply = reply_object(reply)?;

        let saved_name = reply
            .get("name")
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                ParseError::InvalidResponse("file reply is missing 'name'".to_string())
            })?;
        let url = reply
            .get("url")
            .and_then(|value| value.as_str())
            .map(ToOwned::to_owned);

        let mut state = self.state();
        state.name = Some(saved_name.to_string());
        state.url = url;
        state.dirty = false;
        Ok(())
    }

    pub async fn get_data(&self) -> Result<Vec<u8>, ParseError> {
        let _busy = self.busy.acquire("file")?;
        let name = self.name().ok_or_else(|| {
            ParseError::InvalidArgument("file needs a name before it can be fetched".to_string())
        })?;

        let span = tracing::info_span!("parse_file_get", name = %name);
        let data = self
            .client
            .get_bytes(&file_path(&name), 200)
            .instrument(span)
            .await?;

        let mut state = self.state();
        state.data = data.clone();
        state.dirty = false;
        state.data_available = true;
        Ok(data)
    }

    fn state(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn file_path(name: &str) -> String {
    format!("files/{}", urlencoding::encode(name))
}

pub fn guess_content_type(name: &str) -> &'static str {
    let extension = name.rsplit('.').next().unwrap_or_default();
    match extension {
        "json" => "application/json",
        "png" => "application/png",
        "jpg" => "application/jpg",
        "txt" => "application/plain",
        _ => "application/octet-stream",
    }
}
