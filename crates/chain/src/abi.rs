use alloy::sol;

// ─── SimpleToken Interface ──────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract SimpleToken {
        // === ERC-20 core events ===
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        // === Data registry events ===
        event DataUpdated(
            address indexed user,
            uint256 indexed tokenId,
            string data,
            uint256 timestamp
        );

        // === ERC-20 view functions ===
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external pure returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);

        // === Data registry functions ===
        function updateData(uint256 tokenId, string calldata data) external;
        function getUserData(address user, uint256 tokenId) external view returns (string memory);
    }
}
