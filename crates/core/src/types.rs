/// Server-assigned identifiers are opaque GraphQL `ID` strings.
pub type ServerId = String;
