use super::{Connection, ExecuteResponse};

use strata_core::{
    stmt::{CompiledStmt, Value},
    Error, Result,
};

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

/// Scripted in-memory connection for tests.
///
/// Responses are queued up front and handed out in execution order; every
/// executed statement is recorded with its bind values. The handle is a
/// shared reference, so a test can keep a clone after boxing one into a
/// pool and inspect the log afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemConnection {
    state: Rc<RefCell<MemState>>,
}

#[derive(Debug, Default)]
struct MemState {
    responses: VecDeque<ScriptedResponse>,
    log: Vec<ExecutedStmt>,
}

#[derive(Debug)]
enum ScriptedResponse {
    Respond(ExecuteResponse),
    Fail(String),
}

/// One recorded statement execution.
#[derive(Debug, Clone)]
pub struct ExecutedStmt {
    pub sql: String,
    pub params: Vec<Value>,
}

impl MemConnection {
    pub fn new() -> MemConnection {
        MemConnection::default()
    }

    /// Queue the response for the next unanswered execution.
    pub fn respond(&self, response: ExecuteResponse) {
        self.state
            .borrow_mut()
            .responses
            .push_back(ScriptedResponse::Respond(response));
    }

    /// Queue a driver-level failure.
    pub fn fail(&self, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .responses
            .push_back(ScriptedResponse::Fail(message.into()));
    }

    pub fn executed(&self) -> Vec<ExecutedStmt> {
        self.state.borrow().log.clone()
    }

    pub fn executed_count(&self) -> usize {
        self.state.borrow().log.len()
    }
}

impl Connection for MemConnection {
    fn execute(&mut self, stmt: &CompiledStmt, params: Vec<Value>) -> Result<ExecuteResponse> {
        let mut state = self.state.borrow_mut();
        state.log.push(ExecutedStmt {
            sql: stmt.sql.clone(),
            params,
        });

        match state.responses.pop_front() {
            Some(ScriptedResponse::Respond(response)) => Ok(response),
            Some(ScriptedResponse::Fail(message)) => {
                Err(Error::execution("driver failure", Some(message)))
            }
            None => Ok(ExecuteResponse::default()),
        }
    }
}
