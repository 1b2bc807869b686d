/// Transaction types for DMChain
use num_bigint::BigUint;

/// Transaction tag used by the block producer.
pub const TRANSFER_TYPE: &str = "transfer";

/// A transaction that can occur in a block
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub hash: String,
    pub sender: String,
    pub receiver: String,
    pub amount: BigUint,
    pub fee: BigUint,
    pub success: bool,
    pub events: Vec<Event>,
}

impl Transaction {
    /// A successful transfer with no events attached yet.
    pub fn transfer(
        hash: String,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: BigUint,
        fee: BigUint,
    ) -> Self {
        Transaction {
            tx_type: TRANSFER_TYPE.to_string(),
            hash,
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            fee,
            success: true,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }
}

/// Something that happened while executing a transaction
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Keys may repeat; order is preserved.
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Event {
            event_type: event_type.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}
