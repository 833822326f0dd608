//! Prompt-driven state machine for interactive device shells.
//!
//! A [`PromptMachine`] classifies each line of shell output as plain output,
//! a pagination marker, an error, a mode prompt, or a question the device
//! expects an answer to. It tracks which mode the device is in and finds the
//! shortest command sequence that moves the device into another mode.

use std::collections::{HashMap, HashSet, VecDeque};

use log::trace;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

use crate::error::ConnectError;

/// Built-in states that exist in every machine, in index order.
const OUTPUT: usize = 0;
const MORE: usize = 1;
const ERROR: usize = 2;
const BUILTIN_STATES: [&str; 3] = ["output", "more", "error"];

/// What to type when the device asks a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Send this text as-is.
    Text(String),
    /// Look the text up in the machine's runtime parameters (e.g. a secret).
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InputRule {
    answer: Answer,
    /// Keep the question line in the captured output.
    record: bool,
}

/// A mode change edge: sending `command` in `from` lands in `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub command: String,
    pub to: String,
}

/// Collects prompt, input and transition rules before compiling them.
#[derive(Debug, Default, Clone)]
pub struct PromptMachineBuilder {
    prompts: Vec<(String, Vec<String>)>,
    inputs: Vec<(String, InputRule, Vec<String>)>,
    more: Vec<String>,
    errors: Vec<String>,
    ignore_errors: Vec<String>,
    transitions: Vec<Transition>,
}

impl PromptMachineBuilder {
    /// Adds a mode prompt. Patterns are anchored to the start of the line and
    /// tolerate leading NULs and a single carriage return.
    pub fn prompt<I, S>(mut self, state: &str, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| format!(r"^\x00*\r{{0,1}}{}", p.as_ref().trim_start_matches('^')))
            .collect();
        self.prompts.push((state.to_ascii_lowercase(), patterns));
        self
    }

    /// Adds a question the device may ask and the answer to send back.
    pub fn input<I, S>(mut self, state: &str, answer: Answer, record: bool, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();
        self.inputs.push((
            state.to_ascii_lowercase(),
            InputRule { answer, record },
            patterns,
        ));
        self
    }

    pub fn more<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.more
            .extend(patterns.into_iter().map(|p| p.as_ref().to_string()));
        self
    }

    pub fn errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.errors
            .extend(patterns.into_iter().map(|p| p.as_ref().to_string()));
        self
    }

    /// Error lines matching these patterns reset the machine to plain output.
    pub fn ignore_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore_errors
            .extend(patterns.into_iter().map(|p| p.as_ref().to_string()));
        self
    }

    pub fn transition(mut self, from: &str, command: &str, to: &str) -> Self {
        self.transitions.push(Transition {
            from: from.to_ascii_lowercase(),
            command: command.to_string(),
            to: to.to_ascii_lowercase(),
        });
        self
    }

    /// Compiles every pattern into a single [`RegexSet`].
    pub fn build(self) -> Result<PromptMachine, ConnectError> {
        let mut states: Vec<String> = BUILTIN_STATES.iter().map(|s| s.to_string()).collect();
        let mut patterns: Vec<String> = Vec::new();
        // Regex index -> state index.
        let mut owners: Vec<usize> = Vec::new();

        for pattern in self.more {
            patterns.push(pattern);
            owners.push(MORE);
        }
        for pattern in self.errors {
            patterns.push(pattern);
            owners.push(ERROR);
        }

        let first_prompt = states.len();
        for (state, state_patterns) in self.prompts {
            let index = states.len();
            states.push(state);
            for pattern in state_patterns {
                patterns.push(pattern);
                owners.push(index);
            }
        }
        let last_prompt = states.len();

        let mut inputs = HashMap::new();
        inputs.insert(
            MORE,
            InputRule {
                answer: Answer::Text(" ".to_string()),
                record: false,
            },
        );
        for (state, rule, state_patterns) in self.inputs {
            let index = states.len();
            states.push(state);
            inputs.insert(index, rule);
            for pattern in state_patterns {
                patterns.push(pattern);
                owners.push(index);
            }
        }

        let all = RegexSet::new(&patterns).map_err(|err| {
            ConnectError::InvalidPromptMachine(format!("failed to build state regex set: {err}"))
        })?;

        let ignore_errors = if self.ignore_errors.is_empty() {
            None
        } else {
            Some(RegexSet::new(&self.ignore_errors).map_err(|err| {
                ConnectError::InvalidPromptMachine(format!("invalid ignore_errors regex set: {err}"))
            })?)
        };

        Ok(PromptMachine {
            current: OUTPUT,
            states,
            all,
            owners,
            prompts: first_prompt..last_prompt,
            inputs,
            transitions: self.transitions,
            ignore_errors,
            params: HashMap::new(),
            last_prompt: None,
        })
    }
}

/// Compiled prompt state machine for one device platform.
#[derive(Debug, Clone)]
pub struct PromptMachine {
    /// Index of the current state in `states`.
    current: usize,
    states: Vec<String>,
    all: RegexSet,
    owners: Vec<usize>,
    /// State indices that are mode prompts.
    prompts: std::ops::Range<usize>,
    inputs: HashMap<usize, InputRule>,
    transitions: Vec<Transition>,
    ignore_errors: Option<RegexSet>,
    /// Runtime values referenced by [`Answer::Param`].
    params: HashMap<String, String>,
    last_prompt: Option<String>,
}

impl PromptMachine {
    pub fn builder() -> PromptMachineBuilder {
        PromptMachineBuilder::default()
    }

    /// Sets a runtime parameter used to answer device questions.
    pub fn set_param(&mut self, key: &str, value: String) {
        self.params.insert(key.to_string(), value);
    }

    /// Classifies a line. Unmatched lines are plain output.
    fn classify(&self, line: &str) -> usize {
        self.all
            .matches(line)
            .into_iter()
            .next()
            .and_then(|index| self.owners.get(index).copied())
            .unwrap_or(OUTPUT)
    }

    fn is_prompt_state(&self, index: usize) -> bool {
        self.prompts.contains(&index)
    }

    /// Feeds one line of device output and updates the current state.
    pub fn read(&mut self, line: &str) {
        let index = self.classify(line);
        trace!("Read line {:?} -> {}", line, self.states[index]);
        if index == ERROR
            && self
                .ignore_errors
                .as_ref()
                .is_some_and(|set| set.is_match(line))
        {
            trace!("Ignoring error line");
            self.current = OUTPUT;
            return;
        }
        if self.is_prompt_state(index) {
            self.last_prompt = Some(line.to_string());
        }
        self.current = index;
    }

    /// Returns true if `line` is a mode prompt.
    pub fn is_prompt(&self, line: &str) -> bool {
        self.is_prompt_state(self.classify(line))
    }

    /// Returns the text to send if `line` is a question the device is asking,
    /// together with whether the question should stay in the output.
    pub fn answer_for(&self, line: &str) -> Option<(String, bool)> {
        let rule = self.inputs.get(&self.classify(line))?;
        let text = match &rule.answer {
            Answer::Text(text) => text.clone(),
            Answer::Param(key) => self.params.get(key)?.clone(),
        };
        Some((text, rule.record))
    }

    pub fn current_state(&self) -> &str {
        &self.states[self.current]
    }

    /// Last prompt line the machine recognised.
    pub fn current_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    /// True if the last line read was an error message.
    pub fn error(&self) -> bool {
        self.current == ERROR
    }

    /// Returns true if `state` is one of this machine's mode prompts.
    pub fn has_mode(&self, state: &str) -> bool {
        let state = state.to_ascii_lowercase();
        self.prompts
            .clone()
            .any(|index| self.states[index] == state)
    }

    /// Finds the shortest sequence of `(command, resulting_state)` pairs that
    /// moves the device from its current mode to `target`.
    pub fn path_to(&self, target: &str) -> Result<Vec<(String, String)>, ConnectError> {
        let target = target.to_ascii_lowercase();
        let start = self.current_state().to_string();
        if start == target {
            return Ok(Vec::new());
        }

        let mut adjacency: HashMap<&str, Vec<&Transition>> = HashMap::new();
        for edge in &self.transitions {
            adjacency.entry(edge.from.as_str()).or_default().push(edge);
        }

        let mut queue = VecDeque::from([start.as_str()]);
        let mut visited = HashSet::from([start.as_str()]);
        // Child state -> edge that first reached it.
        let mut reached_by: HashMap<&str, &Transition> = HashMap::new();

        while let Some(node) = queue.pop_front() {
            if node == target {
                break;
            }
            for &edge in adjacency.get(node).into_iter().flatten() {
                if visited.insert(edge.to.as_str()) {
                    reached_by.insert(edge.to.as_str(), edge);
                    queue.push_back(edge.to.as_str());
                }
            }
        }

        if !reached_by.contains_key(target.as_str()) {
            return Err(ConnectError::UnreachableState(target));
        }

        let mut path = Vec::new();
        let mut current = target.as_str();
        while current != start {
            let edge = reached_by
                .get(current)
                .ok_or_else(|| ConnectError::UnreachableState(target.clone()))?;
            path.push((edge.command.clone(), edge.to.clone()));
            current = edge.from.as_str();
        }
        path.reverse();
        trace!("Command path: {:?}", path);
        Ok(path)
    }
}

/// Matches carriage returns and backspaces some devices emit at the start of
/// a line when redrawing it.
pub static IGNORE_START_LINE: Lazy<Regex> =
    Lazy::new(
        || match Regex::new(r"^(\r+(\s+\r+)*)|(\u{8}+(\s+\u{8}+)*)") {
            Ok(re) => re,
            Err(err) => panic!("invalid IGNORE_START_LINE regex: {err}"),
        },
    );
